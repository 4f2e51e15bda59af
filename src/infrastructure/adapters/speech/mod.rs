//! Speech Adapter - 语音合成引擎实现

mod fake_engine;
mod say_engine;

pub use fake_engine::FakeSpeechEngine;
pub use say_engine::SayEngine;
