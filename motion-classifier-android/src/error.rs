use jni::JNIEnv;
use motion_classifier::ClassifierError;
use thiserror::Error;

/// Errors surfaced to Kotlin as Java exceptions
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("JNI error: {0}")]
    JniError(String),

    /// The shared classifier cannot be used right now
    #[error("Bridge unavailable: {0}")]
    BridgeUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for JNI operations
pub type JResult<T> = Result<T, BridgeError>;

impl From<jni::errors::Error> for BridgeError {
    fn from(err: jni::errors::Error) -> Self {
        BridgeError::JniError(err.to_string())
    }
}

fn exception_class(error: &BridgeError) -> &'static str {
    match error {
        BridgeError::Classifier(ClassifierError::UnknownCommand(_))
        | BridgeError::Classifier(ClassifierError::InvalidConfig(_)) => {
            "java/lang/IllegalArgumentException"
        }
        BridgeError::Classifier(ClassifierError::Io(_))
        | BridgeError::Classifier(ClassifierError::Json(_)) => "java/io/IOException",
        BridgeError::BridgeUnavailable(_) => "java/lang/IllegalStateException",
        BridgeError::JniError(_) | BridgeError::Internal(_) => "java/lang/RuntimeException",
    }
}

/// Throw Java exception from Rust error
pub fn throw_java_exception(env: &mut JNIEnv, error: &BridgeError) -> JResult<()> {
    env.throw_new(exception_class(error), error.to_string())
        .map_err(|_| BridgeError::JniError("Failed to throw exception".to_string()))?;
    Ok(())
}
