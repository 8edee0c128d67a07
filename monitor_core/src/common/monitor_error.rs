use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Error codes for the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[repr(i32)]
pub enum ErrCode {
    // Config errors (0-99)
    #[strum(serialize = "_CONFIG_ERR_BEGIN")]
    ConfigErrBegin = 0,
    #[strum(serialize = "PARA_ERROR")]
    ParaError = 1,
    #[strum(serialize = "CONFIG_ERROR")]
    ConfigError = 2,
    #[strum(serialize = "_CONFIG_ERR_END")]
    ConfigErrEnd = 99,

    // Fetch errors (100-199)
    #[strum(serialize = "_FETCH_ERR_BEGIN")]
    FetchErrBegin = 100,
    #[strum(serialize = "HTTP_ERROR")]
    Http = 101,
    #[strum(serialize = "HTTP_STATUS")]
    HttpStatus = 102,
    #[strum(serialize = "DECODE_ERROR")]
    Decode = 103,
    #[strum(serialize = "NO_DATA")]
    NoData = 104,
    #[strum(serialize = "MISSING_FIELD")]
    MissingField = 105,
    #[strum(serialize = "UNAUTHORIZED")]
    Unauthorized = 106,
    #[strum(serialize = "_FETCH_ERR_END")]
    FetchErrEnd = 199,

    // Input errors (200-299)
    #[strum(serialize = "_INPUT_ERR_BEGIN")]
    InputErrBegin = 200,
    #[strum(serialize = "MISSING_COLUMN")]
    MissingColumn = 201,
    #[strum(serialize = "BAD_ROW")]
    BadRow = 202,
    #[strum(serialize = "CSV_FORMAT")]
    CsvFormat = 203,
    #[strum(serialize = "_INPUT_ERR_END")]
    InputErrEnd = 299,
}

impl ErrCode {
    pub fn is_config_err(&self) -> bool {
        let code = *self as i32;
        code > Self::ConfigErrBegin as i32 && code < Self::ConfigErrEnd as i32
    }

    pub fn is_fetch_err(&self) -> bool {
        let code = *self as i32;
        code > Self::FetchErrBegin as i32 && code < Self::FetchErrEnd as i32
    }

    pub fn is_input_err(&self) -> bool {
        let code = *self as i32;
        code > Self::InputErrBegin as i32 && code < Self::InputErrEnd as i32
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{errcode}: {msg}")]
pub struct MonitorError {
    pub errcode: ErrCode,
    pub msg: String,
}

impl MonitorError {
    pub fn new(message: impl Into<String>, code: ErrCode) -> Self {
        Self {
            errcode: code,
            msg: message.into(),
        }
    }

    pub fn is_config_err(&self) -> bool {
        self.errcode.is_config_err()
    }

    /// Provider failure for a single symbol.
    pub fn is_fetch_err(&self) -> bool {
        self.errcode.is_fetch_err()
    }

    /// Malformed holdings upload.
    pub fn is_input_err(&self) -> bool {
        self.errcode.is_input_err()
    }
}

impl From<csv::Error> for MonitorError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line());
        match line {
            Some(line) => MonitorError::new(format!("line {line}: {err}"), ErrCode::CsvFormat),
            None => MonitorError::new(err.to_string(), ErrCode::CsvFormat),
        }
    }
}
