use crate::bridge::Bridge;
use crate::error::{throw_java_exception, BridgeError, JResult};
use jni::objects::{JClass, JString};
use jni::sys::{jdouble, jint, jstring};
use jni::JNIEnv;
use motion_classifier::{ClassifierConfig, ControlCommand, Sample};
use std::sync::{Mutex, MutexGuard, Once};

// JNI entry points are free functions, so the one classifier lives here
lazy_static::lazy_static! {
    static ref GLOBAL_BRIDGE: Mutex<Option<Bridge>> = Mutex::new(None);
}

static LOGGER: Once = Once::new();

fn init_logging() {
    LOGGER.call_once(|| {
        #[cfg(target_os = "android")]
        {
            let _ = android_log::init("MotionClassifier");
        }
    });
}

/// Lock the bridge slot; a poisoned lock means a previous call panicked
/// mid-update and the classifier state can no longer be trusted.
fn lock_bridge(slot: &Mutex<Option<Bridge>>) -> JResult<MutexGuard<'_, Option<Bridge>>> {
    slot.lock().map_err(|_| {
        BridgeError::BridgeUnavailable("global bridge lock is poisoned".to_string())
    })
}

/// Run `f` against the bridge in `slot`, creating it on first use
fn with_bridge_in<T>(
    slot: &Mutex<Option<Bridge>>,
    f: impl FnOnce(&mut Bridge) -> JResult<T>,
) -> JResult<T> {
    let mut guard = lock_bridge(slot)?;

    if guard.is_none() {
        *guard = Some(Bridge::new(ClassifierConfig::default())?);
    }
    match guard.as_mut() {
        Some(bridge) => f(bridge),
        None => Err(BridgeError::BridgeUnavailable(
            "bridge not initialized".to_string(),
        )),
    }
}

fn with_bridge<T>(f: impl FnOnce(&mut Bridge) -> JResult<T>) -> JResult<T> {
    with_bridge_in(&GLOBAL_BRIDGE, f)
}

/// Map an impl result onto the 0 / -1 convention, throwing on error
fn status(env: &mut JNIEnv, result: JResult<()>) -> jint {
    match result {
        Ok(()) => 0,
        Err(e) => {
            let _ = throw_java_exception(env, &e);
            -1
        }
    }
}

fn string_result(env: &mut JNIEnv, result: JResult<String>) -> jstring {
    let text = match result {
        Ok(text) => text,
        Err(e) => {
            let _ = throw_java_exception(env, &e);
            return std::ptr::null_mut();
        }
    };
    match env.new_string(&text) {
        Ok(jstr) => jstr.into_raw(),
        Err(_) => {
            let _ = throw_java_exception(
                env,
                &BridgeError::JniError("Failed to create Java string".to_string()),
            );
            std::ptr::null_mut()
        }
    }
}

fn control(command: ControlCommand) -> JResult<()> {
    init_logging();
    with_bridge(|bridge| {
        bridge.command(command);
        Ok(())
    })
}

/// JNI: Reset all state and begin consuming samples
/// Returns: 0 on success, -1 on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_motionclassifier_JniBinding_start(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = control(ControlCommand::Start);
    status(&mut env, result)
}

/// JNI: Stop consuming samples; state stays readable
#[no_mangle]
pub extern "C" fn Java_com_example_motionclassifier_JniBinding_stop(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = control(ControlCommand::Stop);
    status(&mut env, result)
}

/// JNI: Zero the step count without interrupting the stream
#[no_mangle]
pub extern "C" fn Java_com_example_motionclassifier_JniBinding_reset(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = control(ControlCommand::Reset);
    status(&mut env, result)
}

/// JNI: Dispatch a control command by name ("start", "stop", "reset")
/// Unknown names throw IllegalArgumentException.
#[no_mangle]
pub extern "C" fn Java_com_example_motionclassifier_JniBinding_sendCommand(
    mut env: JNIEnv,
    _class: JClass,
    command: JString,
) -> jint {
    let result = send_command_impl(&mut env, &command);
    status(&mut env, result)
}

fn send_command_impl(env: &mut JNIEnv, command: &JString) -> JResult<()> {
    init_logging();
    let name: String = env.get_string(command)?.into();
    with_bridge(|bridge| bridge.command_str(&name))
}

/// JNI: Push accelerometer sample
/// Parameters: x, y, z (m/s²), timestamp (seconds)
/// Samples pushed while stopped are ignored.
#[no_mangle]
pub extern "C" fn Java_com_example_motionclassifier_JniBinding_pushAccelSample(
    mut env: JNIEnv,
    _class: JClass,
    x: jdouble,
    y: jdouble,
    z: jdouble,
    timestamp: jdouble,
) -> jint {
    let sample = Sample::new(x, y, z, timestamp);
    let result = with_bridge(|bridge| {
        bridge.push_sample(sample);
        Ok(())
    });
    status(&mut env, result)
}

/// JNI: Drain pending classification events
/// Returns: JSON array of {stepCount, activityType, magnitude}
#[no_mangle]
pub extern "C" fn Java_com_example_motionclassifier_JniBinding_pollEvents(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    let result = with_bridge(|bridge| bridge.poll_events_json());
    string_result(&mut env, result)
}

/// JNI: Current step count, saturated to the Java int range
#[no_mangle]
pub extern "C" fn Java_com_example_motionclassifier_JniBinding_getStepCount(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    match with_bridge(|bridge| Ok(bridge.step_count())) {
        Ok(steps) => steps.min(jint::MAX as u64) as jint,
        Err(e) => {
            let _ = throw_java_exception(&mut env, &e);
            -1
        }
    }
}

/// JNI: Classifier snapshot as JSON
#[no_mangle]
pub extern "C" fn Java_com_example_motionclassifier_JniBinding_getSnapshotJson(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    let result = with_bridge(|bridge| bridge.snapshot_json());
    string_result(&mut env, result)
}
