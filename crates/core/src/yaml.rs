//! Block-style YAML emitter with a configurable line width
//!
//! `serde_yml` always turns line folding off. The rule file folds long scalars
//! at 80 columns, so rendering drives the libyml emitter directly.
//!
//! Folding is soft: a plain or quoted scalar breaks at the first space after the
//! width is exceeded, and literal blocks are never folded.

use libyml::api::ScalarEventData;
use libyml::document::{yaml_document_end_event_initialize, yaml_document_start_event_initialize};
use libyml::YamlScalarStyleT::{YamlAnyScalarStyle, YamlLiteralScalarStyle};
use libyml::{
    yaml_emitter_delete, yaml_emitter_emit, yaml_emitter_flush, yaml_emitter_initialize,
    yaml_emitter_set_indent, yaml_emitter_set_output, yaml_emitter_set_unicode,
    yaml_emitter_set_width, yaml_mapping_end_event_initialize,
    yaml_mapping_start_event_initialize, yaml_scalar_event_initialize,
    yaml_sequence_end_event_initialize, yaml_sequence_start_event_initialize,
    yaml_stream_end_event_initialize, yaml_stream_start_event_initialize, YamlAnyMappingStyle,
    YamlAnySequenceStyle, YamlEmitterT, YamlEventT, YamlScalarStyleT,
    YamlSingleQuotedScalarStyle, YamlUtf8Encoding,
};
use std::ffi::c_void;
use std::mem::{self, MaybeUninit};
use std::{ptr, slice};

const INDENT: i32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("libyml emitter error: {0}")]
    Emitter(String),
    #[error("scalar of {0} bytes is too long to emit")]
    ScalarTooLong(usize),
    #[error("emitted YAML is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Streams YAML events into an in-memory buffer.
///
/// One emitter produces one document: call [`BlockEmitter::begin_document`],
/// emit the node events, then [`BlockEmitter::finish`].
pub struct BlockEmitter {
    sys: Box<MaybeUninit<YamlEmitterT>>,
    // Boxed so the pointer handed to the write handler survives moves of `self`.
    output: Box<Vec<u8>>,
}

impl BlockEmitter {
    pub fn new(width: i32) -> Result<Self, EmitError> {
        let mut sys = Box::new(MaybeUninit::<YamlEmitterT>::uninit());
        let mut output = Box::new(Vec::new());

        unsafe {
            let emitter = sys.as_mut_ptr();
            if yaml_emitter_initialize(emitter).fail {
                return Err(emitter_error(emitter));
            }
            yaml_emitter_set_unicode(emitter, true);
            yaml_emitter_set_width(emitter, width);
            yaml_emitter_set_indent(emitter, INDENT);
            yaml_emitter_set_output(
                emitter,
                write_to_vec,
                (&mut *output as *mut Vec<u8>).cast::<c_void>(),
            );
        }

        Ok(Self { sys, output })
    }

    /// Start the stream and an implicit (`---`-less) document
    pub fn begin_document(&mut self) -> Result<(), EmitError> {
        self.emit(|event| unsafe { yaml_stream_start_event_initialize(event, YamlUtf8Encoding).fail })?;
        self.emit(|event| unsafe {
            yaml_document_start_event_initialize(
                event,
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                true,
            )
            .fail
        })
    }

    pub fn begin_mapping(&mut self) -> Result<(), EmitError> {
        self.emit(|event| unsafe {
            yaml_mapping_start_event_initialize(
                event,
                ptr::null(),
                ptr::null(),
                true,
                YamlAnyMappingStyle,
            )
            .fail
        })
    }

    pub fn end_mapping(&mut self) -> Result<(), EmitError> {
        self.emit(|event| unsafe { yaml_mapping_end_event_initialize(event).fail })
    }

    pub fn begin_sequence(&mut self) -> Result<(), EmitError> {
        self.emit(|event| unsafe {
            yaml_sequence_start_event_initialize(
                event,
                ptr::null(),
                ptr::null(),
                true,
                YamlAnySequenceStyle,
            )
            .fail
        })
    }

    pub fn end_sequence(&mut self) -> Result<(), EmitError> {
        self.emit(|event| unsafe { yaml_sequence_end_event_initialize(event).fail })
    }

    /// Emit a string scalar in the style [`scalar_style`] picks for it
    pub fn scalar(&mut self, value: &str) -> Result<(), EmitError> {
        let length = i32::try_from(value.len()).map_err(|_| EmitError::ScalarTooLong(value.len()))?;
        let style = scalar_style(value);

        self.emit(|event| unsafe {
            yaml_scalar_event_initialize(
                event,
                ScalarEventData {
                    anchor: ptr::null(),
                    tag: ptr::null(),
                    value: value.as_ptr(),
                    length,
                    plain_implicit: true,
                    quoted_implicit: true,
                    style,
                    _marker: std::marker::PhantomData,
                },
            )
            .fail
        })
    }

    /// Close the document and the stream, and return the emitted text
    pub fn finish(mut self) -> Result<String, EmitError> {
        self.emit(|event| unsafe { yaml_document_end_event_initialize(event, true).fail })?;
        self.emit(|event| unsafe { yaml_stream_end_event_initialize(event).fail })?;

        unsafe {
            let emitter = self.sys.as_mut_ptr();
            if yaml_emitter_flush(emitter).fail {
                return Err(emitter_error(emitter));
            }
        }

        Ok(String::from_utf8(mem::take(&mut *self.output))?)
    }

    /// Initialize an event with `init` and hand it to the emitter, which takes
    /// ownership of it.
    fn emit(&mut self, init: impl FnOnce(*mut YamlEventT) -> bool) -> Result<(), EmitError> {
        let mut event = MaybeUninit::<YamlEventT>::uninit();
        let event = event.as_mut_ptr();

        unsafe {
            let emitter = self.sys.as_mut_ptr();
            if init(event) || yaml_emitter_emit(emitter, event).fail {
                return Err(emitter_error(emitter));
            }
        }

        Ok(())
    }
}

impl Drop for BlockEmitter {
    fn drop(&mut self) {
        unsafe { yaml_emitter_delete(self.sys.as_mut_ptr()) }
    }
}

/// Pick the scalar style for a string value
///
/// Multi-line text becomes a literal block. Text that would read back as a
/// non-string (`true`, `3`, `null`, `""`, ...) is single-quoted. Everything else
/// is left to the emitter, which quotes only when plain style is not allowed.
pub fn scalar_style(value: &str) -> YamlScalarStyleT {
    if value.contains('\n') {
        YamlLiteralScalarStyle
    } else if matches!(serde_yml::from_str(value), Ok(serde_yml::Value::String(_))) {
        YamlAnyScalarStyle
    } else {
        YamlSingleQuotedScalarStyle
    }
}

unsafe fn emitter_error(emitter: *const YamlEmitterT) -> EmitError {
    EmitError::Emitter(serde_yml::libyml::error::Error::emit_error(emitter).to_string())
}

unsafe fn write_to_vec(data: *mut c_void, buffer: *mut u8, size: u64) -> i32 {
    let output = &mut *data.cast::<Vec<u8>>();
    output.extend_from_slice(slice::from_raw_parts(buffer, size as usize));
    1
}
