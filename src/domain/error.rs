//! Error taxonomy shared by every wrapper.
//!
//! Each error carries exactly one leaf [`ErrorKind`]. Leaves are nested inside
//! their category so callers can branch on either level without parsing text.

use std::fmt;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level category of an [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Data,
    Analysis,
    Ml,
    Trading,
    Backtest,
    Configuration,
    Validation,
}

impl Category {
    /// Leaf used when an unclassified cause is wrapped into this category.
    pub fn generic_leaf(self) -> ErrorKind {
        match self {
            Category::Data => ErrorKind::Data(DataErrorKind::Source),
            Category::Analysis => ErrorKind::Analysis(AnalysisErrorKind::InvalidPattern),
            Category::Ml => ErrorKind::Ml(MlErrorKind::Training),
            Category::Trading => ErrorKind::Trading(TradingErrorKind::Execution),
            Category::Backtest => {
                ErrorKind::Backtest(BacktestErrorKind::PerformanceCalculation)
            }
            Category::Configuration => ErrorKind::Configuration,
            Category::Validation => ErrorKind::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataErrorKind {
    Validation,
    Source,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisErrorKind {
    PatternNotFound,
    InvalidPattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MlErrorKind {
    ModelNotFound,
    Training,
    FeatureEngineering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradingErrorKind {
    RiskManagement,
    Execution,
    PositionSizing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BacktestErrorKind {
    PerformanceCalculation,
}

/// Leaf error kind. `Configuration` and `Validation` sit directly under the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Data(DataErrorKind),
    Analysis(AnalysisErrorKind),
    Ml(MlErrorKind),
    Trading(TradingErrorKind),
    Backtest(BacktestErrorKind),
    Configuration,
    Validation,
}

impl ErrorKind {
    pub fn category(self) -> Category {
        match self {
            ErrorKind::Data(_) => Category::Data,
            ErrorKind::Analysis(_) => Category::Analysis,
            ErrorKind::Ml(_) => Category::Ml,
            ErrorKind::Trading(_) => Category::Trading,
            ErrorKind::Backtest(_) => Category::Backtest,
            ErrorKind::Configuration => Category::Configuration,
            ErrorKind::Validation => Category::Validation,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Data(DataErrorKind::Validation) => "data.validation",
            ErrorKind::Data(DataErrorKind::Source) => "data.source",
            ErrorKind::Data(DataErrorKind::InsufficientData) => "data.insufficient_data",
            ErrorKind::Analysis(AnalysisErrorKind::PatternNotFound) => "analysis.pattern_not_found",
            ErrorKind::Analysis(AnalysisErrorKind::InvalidPattern) => "analysis.invalid_pattern",
            ErrorKind::Ml(MlErrorKind::ModelNotFound) => "ml.model_not_found",
            ErrorKind::Ml(MlErrorKind::Training) => "ml.training",
            ErrorKind::Ml(MlErrorKind::FeatureEngineering) => "ml.feature_engineering",
            ErrorKind::Trading(TradingErrorKind::RiskManagement) => "trading.risk_management",
            ErrorKind::Trading(TradingErrorKind::Execution) => "trading.execution",
            ErrorKind::Trading(TradingErrorKind::PositionSizing) => "trading.position_sizing",
            ErrorKind::Backtest(BacktestErrorKind::PerformanceCalculation) => {
                "backtest.performance_calculation"
            }
            ErrorKind::Configuration => "configuration",
            ErrorKind::Validation => "validation",
        };
        f.write_str(name)
    }
}

/// Root error type for tradeguard.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TradingSystemError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TradingSystemError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a low-level cause into the generic leaf of `category`.
    pub fn wrap<E>(category: Category, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            kind: category.generic_leaf(),
            message: cause.to_string(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn with_source<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(cause));
        self
    }

    pub fn data_validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Data(DataErrorKind::Validation), message)
    }

    pub fn data_source(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Data(DataErrorKind::Source), message)
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Data(DataErrorKind::InsufficientData), message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Process exit status for the CLI.
    pub fn exit_status(&self) -> u8 {
        match self.kind {
            ErrorKind::Configuration => 2,
            ErrorKind::Data(DataErrorKind::Source) => 3,
            ErrorKind::Validation | ErrorKind::Data(DataErrorKind::Validation) => 4,
            ErrorKind::Data(DataErrorKind::InsufficientData) => 5,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for TradingSystemError {
    fn from(err: std::io::Error) -> Self {
        Self::wrap(Category::Data, err)
    }
}

impl From<csv::Error> for TradingSystemError {
    fn from(err: csv::Error) -> Self {
        Self::wrap(Category::Data, err)
    }
}

impl From<serde_json::Error> for TradingSystemError {
    fn from(err: serde_json::Error) -> Self {
        Self::wrap(Category::Validation, err)
    }
}

impl From<&TradingSystemError> for std::process::ExitCode {
    fn from(err: &TradingSystemError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
