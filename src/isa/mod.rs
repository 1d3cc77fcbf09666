//! The instruction-format-agnostic core shared by the assembler and the
//! simulator: bit-field arithmetic, the decoded operation type, the
//! encoder, the decoder, and the execute engine.

pub mod decode;
pub mod encode;
pub mod exec;
pub mod fields;
pub mod op;

pub use decode::{decode, DecodeError};
pub use encode::{assemble, encode_op, EncodeError, Operand};
pub use exec::{execute, ExecutionError};
pub use op::Op;
