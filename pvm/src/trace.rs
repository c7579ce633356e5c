//! Execution traces
//!
//! Tracing is pluggable and best-effort: the executor feeds every record
//! into a sink, and the null sink compiles down to nothing so
//! deterministic-only runs pay no cost. A sink must never influence the
//! execution result.

use crate::consts::VM_REGISTER_COUNT;

use pvm_asm::Word;

/// One record per executed instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TraceRecord {
    /// Monotonic step counter.
    pub step: u64,
    /// Program counter before the instruction ran.
    pub pc: u32,
    /// Opcode mnemonic.
    pub name: &'static str,
    /// Raw opcode octet.
    pub opcode: u8,
    /// Gas counter after the charge and the instruction effect.
    pub gas_after: i64,
    /// Register file after the instruction.
    pub registers: [Word; VM_REGISTER_COUNT],
    /// Address of the load performed this step, zero if none.
    pub load_addr: u32,
    /// Value of the load performed this step.
    pub load_value: u64,
    /// Address of the store performed this step, zero if none.
    pub store_addr: u32,
    /// Value of the store performed this step.
    pub store_value: u64,
}

impl TraceRecord {
    /// Opcode octet formatted as `0x..`.
    pub fn opcode_hex(&self) -> String {
        format!("{:#04x}", self.opcode)
    }
}

/// One record per host call, interleaved with instruction records.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HostCallRecord {
    /// Host-call identifier from `ECALLI`.
    pub host_id: Word,
    /// Gas counter when the handler was entered.
    pub gas_before: i64,
    /// Gas counter when the handler returned.
    pub gas_after: i64,
    /// Service identity, when the host layer tracks one.
    pub service: Option<Word>,
}

/// Receiver of execution trace records.
pub trait TraceSink {
    /// Record one executed instruction.
    fn record(&mut self, _record: &TraceRecord) {}

    /// Record one host call.
    fn record_host_call(&mut self, _record: &HostCallRecord) {}
}

/// Sink that drops every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullTracer;

impl TraceSink for NullTracer {}

/// A single entry of a collected trace.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TraceEvent {
    /// An executed instruction.
    Instruction(TraceRecord),
    /// A host call.
    HostCall(HostCallRecord),
}

/// Sink that collects every record in order, for replay comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
}

impl RecordingTracer {
    /// Collected events, in execution order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Consume the tracer, returning the collected events.
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }
}

impl TraceSink for RecordingTracer {
    fn record(&mut self, record: &TraceRecord) {
        self.events.push(TraceEvent::Instruction(record.clone()));
    }

    fn record_host_call(&mut self, record: &HostCallRecord) {
        self.events.push(TraceEvent::HostCall(record.clone()));
    }
}
