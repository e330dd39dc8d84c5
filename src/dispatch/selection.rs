/// Properties requested from [`Dispatcher::get_all`](super::Dispatcher::get_all)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Configured defaults, or every virtual property
    #[default]
    Unspecified,
    Single(String),
    /// Explicit names; an empty set behaves like [`Selection::Unspecified`]
    Set(Vec<String>),
}

impl Selection {
    pub fn is_unspecified(&self) -> bool {
        match self {
            Selection::Unspecified => true,
            Selection::Single(_) => false,
            Selection::Set(names) => names.is_empty(),
        }
    }
}

impl From<&str> for Selection {
    fn from(name: &str) -> Self {
        Selection::Single(name.to_string())
    }
}

impl From<String> for Selection {
    fn from(name: String) -> Self {
        Selection::Single(name)
    }
}

impl From<Vec<String>> for Selection {
    fn from(names: Vec<String>) -> Self {
        Selection::Set(names)
    }
}

impl From<&[&str]> for Selection {
    fn from(names: &[&str]) -> Self {
        Selection::Set(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Selection {
    fn from(names: [&str; N]) -> Self {
        Selection::Set(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<T: Into<Selection>> From<Option<T>> for Selection {
    fn from(selection: Option<T>) -> Self {
        selection.map(Into::into).unwrap_or_default()
    }
}
