// Motion Classifier Android JNI Library
// Exposes the Rust motion classifier to Kotlin via JNI

pub mod android_jni;
pub mod bridge;
pub mod error;

pub use bridge::{Bridge, EVENT_BUFFER};
pub use error::{BridgeError, JResult};
