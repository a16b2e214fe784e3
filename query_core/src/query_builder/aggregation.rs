use type_mapping::ValueType;

/// Represents SQL aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// COUNT(*) or COUNT(field)
    Count,
    /// COUNT(DISTINCT field)
    CountDistinct,
    /// SUM(field), widened to BIGINT for integer input
    Sum,
    /// AVG(field), truncated to BIGINT for integer input
    Avg,
    /// AVG(field) as DOUBLE PRECISION
    AvgExact,
    /// MIN(field)
    Min,
    /// MAX(field)
    Max,
}

impl AggregateFunction {
    pub fn to_sql(&self) -> &'static str {
        match self {
            AggregateFunction::Count | AggregateFunction::CountDistinct => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg | AggregateFunction::AvgExact => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }

    pub fn is_distinct(&self) -> bool {
        matches!(self, AggregateFunction::CountDistinct)
    }

    /// Type produced for an argument of type `arg`
    pub fn result_type(&self, arg: Option<ValueType>) -> Option<ValueType> {
        match self {
            AggregateFunction::Count | AggregateFunction::CountDistinct => Some(ValueType::BigInt),
            AggregateFunction::AvgExact => Some(ValueType::Double),
            AggregateFunction::Sum | AggregateFunction::Avg => match arg {
                Some(t) if t.is_integer() => Some(ValueType::BigInt),
                Some(_) => Some(ValueType::Double),
                None => None,
            },
            AggregateFunction::Min | AggregateFunction::Max => arg,
        }
    }

    /// Wrap the rendered aggregate call so the database returns the same
    /// type the expression decodes into
    pub fn render(&self, arg_sql: &str, arg_type: Option<ValueType>) -> String {
        let call = if self.is_distinct() {
            format!("{}(DISTINCT {})", self.to_sql(), arg_sql)
        } else {
            format!("{}({})", self.to_sql(), arg_sql)
        };
        let integer_arg = arg_type.map(|t| t.is_integer()).unwrap_or(false);

        match self {
            AggregateFunction::Sum if integer_arg => format!("CAST({} AS BIGINT)", call),
            AggregateFunction::Avg if integer_arg => format!("CAST(TRUNC({}) AS BIGINT)", call),
            AggregateFunction::AvgExact => format!("CAST({} AS DOUBLE PRECISION)", call),
            _ => call,
        }
    }
}
