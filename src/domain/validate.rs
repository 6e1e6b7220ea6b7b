//! Precondition checks on tabular arguments.
//!
//! An argument is tabular when it implements [`Tabular`]. Argument types
//! expose their tabular members through [`TableArgs`], positional members
//! first and named members after, and the first one found is checked. When no
//! argument is tabular the call proceeds unchecked.

use crate::domain::error::TradingSystemError;
use crate::domain::operation::{AsyncOperation, Operation};
use std::future::Future;
use std::sync::Arc;

/// A value with a row count and named columns.
pub trait Tabular {
    fn row_count(&self) -> usize;

    fn column_names(&self) -> Vec<&str>;

    fn has_column(&self, name: &str) -> bool {
        self.column_names().iter().any(|c| *c == name)
    }
}

/// Lists the tabular values inside an argument list, in call order.
pub trait TableArgs {
    fn tables(&self) -> Vec<&dyn Tabular> {
        Vec::new()
    }
}

macro_rules! no_tables {
    ($($t:ty),* $(,)?) => {
        $(impl TableArgs for $t {})*
    };
}

no_tables!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    str,
    String,
    chrono::NaiveDate,
);

impl<T: TableArgs + ?Sized> TableArgs for &T {
    fn tables(&self) -> Vec<&dyn Tabular> {
        (**self).tables()
    }
}

impl<T: TableArgs + ?Sized> TableArgs for Box<T> {
    fn tables(&self) -> Vec<&dyn Tabular> {
        (**self).tables()
    }
}

impl<T: TableArgs + ?Sized> TableArgs for Arc<T> {
    fn tables(&self) -> Vec<&dyn Tabular> {
        (**self).tables()
    }
}

impl<T: TableArgs> TableArgs for Option<T> {
    fn tables(&self) -> Vec<&dyn Tabular> {
        self.as_ref().map(TableArgs::tables).unwrap_or_default()
    }
}

macro_rules! tuple_tables {
    ($($name:ident),+) => {
        impl<$($name: TableArgs),+> TableArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn tables(&self) -> Vec<&dyn Tabular> {
                let ($($name,)+) = self;
                let mut found = Vec::new();
                $(found.extend($name.tables());)+
                found
            }
        }
    };
}

tuple_tables!(A);
tuple_tables!(A, B);
tuple_tables!(A, B, C);
tuple_tables!(A, B, C, D);
tuple_tables!(A, B, C, D, E);

/// Minimum shape a tabular argument must have.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationRule {
    pub required_columns: Vec<String>,
    pub min_rows: usize,
}

impl ValidationRule {
    pub fn new<I, S>(required_columns: I, min_rows: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_columns: required_columns.into_iter().map(Into::into).collect(),
            min_rows,
        }
    }

    /// Check `table`, reporting every violation in one `DataError::Validation`.
    pub fn check(&self, table: &dyn Tabular) -> Result<(), TradingSystemError> {
        let rows = table.row_count();
        let missing: Vec<&str> = self
            .required_columns
            .iter()
            .map(String::as_str)
            .filter(|c| !table.has_column(c))
            .collect();

        let mut problems = Vec::new();
        if rows < self.min_rows {
            problems.push(format!(
                "table has {} rows, need at least {}",
                rows, self.min_rows
            ));
        }
        if !missing.is_empty() {
            problems.push(format!("missing required columns: {}", missing.join(", ")));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(TradingSystemError::data_validation(problems.join("; ")))
        }
    }
}

pub struct Validated<O> {
    inner: O,
    rule: ValidationRule,
}

/// Check the first tabular argument against `rule` before calling `inner`.
pub fn with_validation<O>(inner: O, rule: ValidationRule) -> Validated<O> {
    Validated { inner, rule }
}

impl<O> Validated<O> {
    pub fn rule(&self) -> &ValidationRule {
        &self.rule
    }

    fn precheck<A: TableArgs>(&self, operation: &str, args: &A) -> Result<(), TradingSystemError> {
        let tables = args.tables();
        let Some(table) = tables.first() else {
            return Ok(());
        };
        self.rule.check(*table).inspect_err(|e| {
            tracing::warn!(operation = %operation, "{} rejected input: {}", operation, e.message());
        })
    }
}

impl<A, O> Operation<A> for Validated<O>
where
    A: TableArgs,
    O: Operation<A>,
{
    type Output = O::Output;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(&self, args: A) -> Result<O::Output, TradingSystemError> {
        self.precheck(self.inner.name(), &args)?;
        self.inner.call(args)
    }
}

impl<A, O> AsyncOperation<A> for Validated<O>
where
    A: TableArgs + Send,
    O: AsyncOperation<A>,
{
    type Output = O::Output;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(
        &self,
        args: A,
    ) -> impl Future<Output = Result<O::Output, TradingSystemError>> + Send {
        let checked = self.precheck(self.inner.name(), &args);
        async move {
            checked?;
            self.inner.call(args).await
        }
    }
}
