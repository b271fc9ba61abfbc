//! Ordering terms.

/// Options for [`crate::QueryBuilder::order_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderOptions {
    pub ascending: bool,
    /// `None` leaves null placement to the server.
    pub nulls_first: Option<bool>,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self {
            ascending: true,
            nulls_first: None,
        }
    }
}

impl OrderOptions {
    pub fn descending() -> Self {
        Self {
            ascending: false,
            nulls_first: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OrderTerm {
    pub column: String,
    pub options: OrderOptions,
}

impl OrderTerm {
    /// `col.asc|desc[.nullsfirst|.nullslast]`
    pub fn render(&self) -> String {
        let direction = if self.options.ascending { "asc" } else { "desc" };
        match self.options.nulls_first {
            Some(true) => format!("{}.{}.nullsfirst", self.column, direction),
            Some(false) => format!("{}.{}.nullslast", self.column, direction),
            None => format!("{}.{}", self.column, direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_terms() {
        let term = |column: &str, options| OrderTerm {
            column: column.to_string(),
            options,
        };

        assert_eq!(term("created_at", OrderOptions::default()).render(), "created_at.asc");
        assert_eq!(term("due", OrderOptions::descending()).render(), "due.desc");
        assert_eq!(
            term(
                "due",
                OrderOptions {
                    ascending: false,
                    nulls_first: Some(false)
                }
            )
            .render(),
            "due.desc.nullslast"
        );
        assert_eq!(
            term(
                "title",
                OrderOptions {
                    ascending: true,
                    nulls_first: Some(true)
                }
            )
            .render(),
            "title.asc.nullsfirst"
        );
    }
}
