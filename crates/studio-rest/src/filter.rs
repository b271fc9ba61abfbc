//! Row filters and their PostgREST query-string rendering.

use std::fmt;

/// Comparison operators understood by the query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Is,
    In,
}

impl FilterOperator {
    /// Operator token as it appears in the query string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Like => "like",
            FilterOperator::Ilike => "ilike",
            FilterOperator::Is => "is",
            FilterOperator::In => "in",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a filter.
///
/// Scalars are rendered verbatim. Lists are meant for `in` and render as a
/// parenthesised, comma-separated set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Scalar(String),
    List(Vec<String>),
}

impl FilterValue {
    fn render(&self, operator: FilterOperator) -> String {
        match (operator, self) {
            (FilterOperator::In, FilterValue::List(items)) => render_list(items),
            (FilterOperator::In, FilterValue::Scalar(item)) => {
                render_list(std::slice::from_ref(item))
            }
            (_, FilterValue::Scalar(value)) => value.clone(),
            (_, FilterValue::List(items)) => items.join(","),
        }
    }
}

/// `(a,b,c)`. Members that would break the list syntax are double-quoted,
/// with `"` and `\` backslash-escaped inside the quotes.
fn render_list(items: &[String]) -> String {
    let members: Vec<String> = items.iter().map(|item| quote_member(item)).collect();
    format!("({})", members.join(","))
}

fn quote_member(item: &str) -> String {
    let needs_quotes = item.is_empty()
        || item
            .chars()
            .any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\') || c.is_whitespace());
    if !needs_quotes {
        return item.to_string();
    }
    let mut quoted = String::with_capacity(item.len() + 2);
    quoted.push('"');
    for c in item.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Scalar(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Scalar(value)
    }
}

impl From<&String> for FilterValue {
    fn from(value: &String) -> Self {
        FilterValue::Scalar(value.clone())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Scalar(value.to_string())
    }
}

macro_rules! scalar_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    FilterValue::Scalar(value.to_string())
                }
            }
        )*
    };
}

scalar_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl<T: ToString> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        FilterValue::List(values.iter().map(ToString::to_string).collect())
    }
}

impl<T: ToString> From<&[T]> for FilterValue {
    fn from(values: &[T]) -> Self {
        FilterValue::List(values.iter().map(ToString::to_string).collect())
    }
}

impl<T: ToString, const N: usize> From<[T; N]> for FilterValue {
    fn from(values: [T; N]) -> Self {
        FilterValue::List(values.iter().map(ToString::to_string).collect())
    }
}

/// One `column=[not.]op.value` query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Filter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
    pub negated: bool,
}

impl Filter {
    /// Parameter value, without the column name.
    pub fn render(&self) -> String {
        let value = self.value.render(self.operator);
        if self.negated {
            format!("not.{}.{}", self.operator, value)
        } else {
            format!("{}.{}", self.operator, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(operator: FilterOperator, value: impl Into<FilterValue>, negated: bool) -> Filter {
        Filter {
            column: "col".to_string(),
            operator,
            value: value.into(),
            negated,
        }
    }

    #[test]
    fn test_scalar_filters() {
        assert_eq!(filter(FilterOperator::Eq, "draft", false).render(), "eq.draft");
        assert_eq!(filter(FilterOperator::Gte, 10, false).render(), "gte.10");
        assert_eq!(filter(FilterOperator::Is, "null", false).render(), "is.null");
        assert_eq!(filter(FilterOperator::Ilike, "%intro%", false).render(), "ilike.%intro%");
    }

    #[test]
    fn test_negated_filters() {
        assert_eq!(filter(FilterOperator::In, vec![1, 2, 3], true).render(), "not.in.(1,2,3)");
        assert_eq!(filter(FilterOperator::Is, "null", true).render(), "not.is.null");
        assert_eq!(filter(FilterOperator::Eq, true, true).render(), "not.eq.true");
    }

    #[test]
    fn test_in_list_quotes_reserved_characters() {
        let value = FilterValue::from(vec!["plain", "a,b", "f(x)"]);
        assert_eq!(
            filter(FilterOperator::In, value, false).render(),
            r#"in.(plain,"a,b","f(x)")"#
        );

        let value = FilterValue::from(vec!["say \"hi\", ok", "x"]);
        assert_eq!(
            filter(FilterOperator::In, value, false).render(),
            r#"in.("say \"hi\", ok",x)"#
        );

        let value = FilterValue::from(vec![r#"6" cut"#, r"C:\takes", "two words", ""]);
        assert_eq!(
            filter(FilterOperator::In, value, false).render(),
            r#"in.("6\" cut","C:\\takes","two words","")"#
        );
    }

    #[test]
    fn test_in_with_scalar_is_single_member_list() {
        assert_eq!(filter(FilterOperator::In, "review", false).render(), "in.(review)");
    }

    #[test]
    fn test_array_and_slice_conversions() {
        assert_eq!(
            FilterValue::from(["a", "b"]),
            FilterValue::List(vec!["a".to_string(), "b".to_string()])
        );
        let ids = [4u64, 5];
        assert_eq!(
            FilterValue::from(&ids[..]),
            FilterValue::List(vec!["4".to_string(), "5".to_string()])
        );
    }
}
