//! Frame-level protocol types the extension consumes (RFC 6455).

pub mod classify;
pub mod frame;
pub mod mask;
pub mod opcode;

pub use classify::{is_compressed_data_frame, is_continuation_frame, is_data_frame};
pub use frame::Frame;
pub use mask::{apply_mask, apply_mask_fast};
pub use opcode::OpCode;
