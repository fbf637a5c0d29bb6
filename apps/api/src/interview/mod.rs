// Interview orchestration: state machine, directive assembly, reply extraction,
// the per-turn engine and its HTTP surface.
// All generation goes through the `AiGateway` held by the engine.

pub mod assembler;
pub mod engine;
pub mod extractor;
pub mod handlers;
pub mod locks;
pub mod prompts;
pub mod status;
pub mod submission;
