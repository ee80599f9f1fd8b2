//! C ABI surface
//!
//! Every export returns an integer status (`0` success, negative on failure,
//! see [`config::status`](crate::config::status)) and never unwinds: panics are
//! caught at the boundary and reported as `FT_ERR_PANIC`.
//!
//! `ft_load_model`, `ft_get_vector_dimension`, `ft_get_sentence_vector` and
//! `ft_save_model` keep the wrapper's historical contract and return `-1` for
//! every failure. The precise code and message of the most recent failure on
//! the calling thread are available through [`ft_last_error_code`] and
//! [`ft_last_error_message`].
//!
//! # Ownership
//!
//! - `FtHandle` is created by `ft_handle_new` and released with
//!   `ft_handle_free`.
//! - `ft_predict` fills an [`FtPredictionList`] whose array and labels belong to
//!   the caller until handed back to [`ft_predictions_free`].
//! - Sentence vectors are written into caller storage; nothing is allocated.
//!
//! # Threading
//!
//! A handle has no internal locking. Callers must not use one handle from two
//! threads at once.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_float, c_int};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::ptr;

use crate::args::{ModelKind, TrainingConfig};
use crate::config::status;
use crate::engine::Engine;
use crate::error::BridgeError;
use crate::handle::ModelHandle;
use crate::training;

struct LastError {
    code: c_int,
    message: CString,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<LastError>> = const { RefCell::new(None) };
}

/// Opaque model handle owned by the caller
pub struct FtHandle {
    inner: ModelHandle<Box<dyn Engine>>,
}

impl FtHandle {
    /// Wrap an engine for use across the C boundary
    pub fn with_engine(engine: Box<dyn Engine>) -> Self {
        Self {
            inner: ModelHandle::new(engine),
        }
    }

    /// Hand ownership to a C caller; release with [`ft_handle_free`]
    pub fn into_raw(self) -> *mut FtHandle {
        Box::into_raw(Box::new(self))
    }
}

/// One label and its probability
#[repr(C)]
pub struct FtPrediction {
    /// NUL-terminated, owned by the enclosing list
    pub label: *mut c_char,
    pub probability: c_float,
}

/// Bridge-allocated prediction array
#[repr(C)]
pub struct FtPredictionList {
    pub items: *mut FtPrediction,
    pub len: usize,
}

impl FtPredictionList {
    const EMPTY: FtPredictionList = FtPredictionList {
        items: ptr::null_mut(),
        len: 0,
    };
}

enum FfiError {
    Bridge(BridgeError),
    InvalidInput(String),
}

impl From<BridgeError> for FfiError {
    fn from(err: BridgeError) -> Self {
        Self::Bridge(err)
    }
}

type FfiResult<T> = Result<T, FfiError>;

fn set_last_error(code: c_int, message: String) {
    let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(LastError { code, message }));
}

/// Run `body`, converting errors and panics into status codes
fn guard<F>(operation: &str, body: F) -> c_int
where
    F: FnOnce() -> FfiResult<c_int>,
{
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(code)) => code,
        Ok(Err(FfiError::Bridge(err))) => {
            log::warn!("{} failed: {}", operation, err);
            let code = err.status_code();
            set_last_error(code, err.to_string());
            code
        }
        Ok(Err(FfiError::InvalidInput(msg))) => {
            log::warn!("{} rejected input: {}", operation, msg);
            set_last_error(status::INVALID_INPUT, msg);
            status::INVALID_INPUT
        }
        Err(_) => {
            log::error!("{} panicked", operation);
            set_last_error(status::PANIC, format!("{} panicked", operation));
            status::PANIC
        }
    }
}

/// Collapse any failure to the single `-1` sentinel
fn sentinel(code: c_int) -> c_int {
    if code < 0 {
        status::FAILURE
    } else {
        code
    }
}

unsafe fn str_arg<'a>(ptr: *const c_char, name: &str) -> FfiResult<&'a str> {
    if ptr.is_null() {
        return Err(FfiError::InvalidInput(format!("{} is null", name)));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| FfiError::InvalidInput(format!("{} is not valid UTF-8", name)))
}

unsafe fn handle_ref<'a>(handle: *const FtHandle) -> FfiResult<&'a FtHandle> {
    handle
        .as_ref()
        .ok_or_else(|| FfiError::InvalidInput("handle is null".to_string()))
}

unsafe fn handle_mut<'a>(handle: *mut FtHandle) -> FfiResult<&'a mut FtHandle> {
    handle
        .as_mut()
        .ok_or_else(|| FfiError::InvalidInput("handle is null".to_string()))
}

fn to_c_int(value: usize) -> FfiResult<c_int> {
    c_int::try_from(value).map_err(|_| {
        FfiError::Bridge(BridgeError::invalid_argument(format!(
            "{} does not fit a C int",
            value
        )))
    })
}

/// Create a handle over the fastText engine. Returns null on failure.
#[cfg(feature = "fasttext")]
#[no_mangle]
pub extern "C" fn ft_handle_new() -> *mut FtHandle {
    catch_unwind(|| {
        FtHandle::with_engine(Box::new(crate::engine::FastTextEngine::new())).into_raw()
    })
    .unwrap_or(ptr::null_mut())
}

/// Release a handle. Null is ignored.
///
/// # Safety
///
/// `handle` must come from `ft_handle_new` (or [`FtHandle::into_raw`]) and must
/// not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn ft_handle_free(handle: *mut FtHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Load the model at `path` into the handle. Loading again is a no-op.
///
/// # Safety
///
/// `handle` must be a live handle and `path` a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ft_load_model(handle: *mut FtHandle, path: *const c_char) -> c_int {
    sentinel(guard("ft_load_model", || {
        let handle = handle_mut(handle)?;
        let path = str_arg(path, "path")?;
        handle.inner.load(path)?;
        Ok(status::OK)
    }))
}

/// Embedding width, or `-1` when no model is loaded.
///
/// # Safety
///
/// `handle` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn ft_get_vector_dimension(handle: *const FtHandle) -> c_int {
    sentinel(guard("ft_get_vector_dimension", || {
        let handle = handle_ref(handle)?;
        to_c_int(handle.inner.dimension()?)
    }))
}

/// Predict up to `k` labels scoring at least `threshold`.
///
/// On success `out` owns a new array that must be released with
/// `ft_predictions_free`. On failure `out` is left empty.
///
/// # Safety
///
/// `handle` must be a live handle, `query` a NUL-terminated string and `out`
/// a valid, writable `FtPredictionList`.
#[no_mangle]
pub unsafe extern "C" fn ft_predict(
    handle: *const FtHandle,
    query: *const c_char,
    k: c_int,
    threshold: c_float,
    out: *mut FtPredictionList,
) -> c_int {
    guard("ft_predict", || {
        let out = out
            .as_mut()
            .ok_or_else(|| FfiError::InvalidInput("out is null".to_string()))?;
        *out = FtPredictionList::EMPTY;

        let handle = handle_ref(handle)?;
        let query = str_arg(query, "query")?;
        let k = usize::try_from(k).map_err(|_| {
            BridgeError::invalid_argument(format!("k needs to be 1 or higher, got {}", k))
        })?;

        let predictions = handle.inner.predict(query, k, threshold)?;

        let mut items = Vec::with_capacity(predictions.len());
        for prediction in predictions {
            let label = match CString::new(prediction.label) {
                Ok(label) => label,
                Err(_) => {
                    release_items(items);
                    return Err(BridgeError::engine("label contains a NUL byte").into());
                }
            };
            items.push(FtPrediction {
                label: label.into_raw(),
                probability: prediction.probability,
            });
        }

        let len = items.len();
        out.items = Box::into_raw(items.into_boxed_slice()) as *mut FtPrediction;
        out.len = len;
        Ok(status::OK)
    })
}

fn release_items(items: Vec<FtPrediction>) {
    for item in items {
        if !item.label.is_null() {
            // SAFETY: every label was produced by CString::into_raw in ft_predict
            drop(unsafe { CString::from_raw(item.label) });
        }
    }
}

/// Release a list filled by `ft_predict` and reset it to empty.
///
/// # Safety
///
/// `list` must be null or point to a list last filled by `ft_predict` and not
/// released since.
#[no_mangle]
pub unsafe extern "C" fn ft_predictions_free(list: *mut FtPredictionList) {
    let Some(list) = list.as_mut() else {
        return;
    };
    if !list.items.is_null() {
        let items = Box::from_raw(ptr::slice_from_raw_parts_mut(list.items, list.len));
        release_items(items.into_vec());
    }
    *list = FtPredictionList::EMPTY;
}

/// Write the sentence vector of `query` into `buffer`.
///
/// `size` must equal the model dimension; otherwise the buffer is untouched and
/// `FT_ERR_SIZE_MISMATCH` is returned.
///
/// # Safety
///
/// `handle` must be a live handle, `query` a NUL-terminated string and `buffer`
/// valid for `size` floats.
#[no_mangle]
pub unsafe extern "C" fn ft_get_sentence_vector(
    handle: *const FtHandle,
    query: *const c_char,
    buffer: *mut c_float,
    size: c_int,
) -> c_int {
    sentinel(guard("ft_get_sentence_vector", || {
        let handle = handle_ref(handle)?;
        let query = str_arg(query, "query")?;
        let size = usize::try_from(size).map_err(|_| {
            BridgeError::invalid_argument(format!("negative buffer size {}", size))
        })?;

        let buffer: &mut [f32] = if size == 0 {
            &mut []
        } else if buffer.is_null() {
            return Err(FfiError::InvalidInput("buffer is null".to_string()));
        } else {
            std::slice::from_raw_parts_mut(buffer, size)
        };

        handle.inner.sentence_vector(query, buffer)?;
        Ok(status::OK)
    }))
}

/// Save the handle's model to `path`.
///
/// # Safety
///
/// `handle` must be a live handle and `path` a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ft_save_model(handle: *mut FtHandle, path: *const c_char) -> c_int {
    sentinel(guard("ft_save_model", || {
        let handle = handle_mut(handle)?;
        let path = str_arg(path, "path")?;
        handle.inner.save_model(path)?;
        Ok(status::OK)
    }))
}

#[allow(clippy::too_many_arguments)]
#[cfg_attr(not(feature = "fasttext"), allow(dead_code))]
unsafe fn train_with<E: Engine + Default>(
    model_kind: *const c_char,
    input: *const c_char,
    output: *const c_char,
    epoch: c_int,
    word_ngrams: c_int,
    thread: c_int,
    lr: c_float,
) -> c_int {
    guard("ft_train", || {
        // Reject the kind before anything touches the filesystem
        let kind: ModelKind = str_arg(model_kind, "model_kind")?.parse()?;
        let config = TrainingConfig::new(kind, str_arg(input, "input")?, str_arg(output, "output")?)
            .epoch(epoch)
            .word_ngrams(word_ngrams)
            .thread(thread)
            .lr(lr);
        training::train::<E>(&config)?;
        Ok(status::OK)
    })
}

#[cfg_attr(not(feature = "fasttext"), allow(dead_code))]
unsafe fn quantize_with<E: Engine + Default>(
    input: *const c_char,
    output: *const c_char,
) -> c_int {
    guard("ft_quantize", || {
        let input = str_arg(input, "input")?;
        let output = str_arg(output, "output")?;
        training::quantize::<E>(Path::new(input), Path::new(output))?;
        Ok(status::OK)
    })
}

/// Train a model into `<output>.bin` (or `.ftz`), `<output>.vec`.
///
/// `model_kind` is one of `supervised`, `cbow`, `skipgram`.
///
/// # Safety
///
/// All string arguments must be NUL-terminated.
#[cfg(feature = "fasttext")]
#[no_mangle]
pub unsafe extern "C" fn ft_train(
    model_kind: *const c_char,
    input: *const c_char,
    output: *const c_char,
    epoch: c_int,
    word_ngrams: c_int,
    thread: c_int,
    lr: c_float,
) -> c_int {
    train_with::<crate::engine::FastTextEngine>(
        model_kind,
        input,
        output,
        epoch,
        word_ngrams,
        thread,
        lr,
    )
}

/// Quantize `<output>.bin` into `<output>.ftz`. `input` does not locate the
/// source model.
///
/// # Safety
///
/// Both arguments must be NUL-terminated strings.
#[cfg(feature = "fasttext")]
#[no_mangle]
pub unsafe extern "C" fn ft_quantize(input: *const c_char, output: *const c_char) -> c_int {
    quantize_with::<crate::engine::FastTextEngine>(input, output)
}

/// Message of the last failure on this thread, or null.
///
/// The pointer stays valid until the next failing call on the same thread.
#[no_mangle]
pub extern "C" fn ft_last_error_message() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(ptr::null(), |last| last.message.as_ptr())
    })
}

/// Status code of the last failure on this thread, or `0` if none.
#[no_mangle]
pub extern "C" fn ft_last_error_code() -> c_int {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(status::OK, |last| last.code))
}

/// Install a stderr log subscriber. `filter` may be null.
///
/// # Safety
///
/// `filter` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ft_init_logging(filter: *const c_char) -> c_int {
    guard("ft_init_logging", || {
        let filter = if filter.is_null() {
            None
        } else {
            Some(str_arg(filter, "filter")?)
        };
        crate::logging::init_logging(filter)?;
        Ok(status::OK)
    })
}
