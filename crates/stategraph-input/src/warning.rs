//! Warning types for non-fatal problems found while reading inputs.
//!
//! A lowstate dump frequently references states that are not part of the
//! rendered highstate (a requisite on a state from an sls that was not
//! included, for example). Such references are dropped from the graph and
//! reported as a [`Warning`] instead of failing the whole load.
//!
//! # Examples
//!
//! ```
//! use stategraph_input::warning::Warning;
//!
//! let warning = Warning::UnresolvedTarget {
//!     state: "service.nginx".to_string(),
//!     target: "pkg.nginx".to_string(),
//! };
//! assert_eq!(warning.kind(), "unresolved_target");
//! assert!(warning.description().contains("pkg.nginx"));
//! ```

/// A non-fatal warning that occurred while building a graph source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A requisite names a state that matches no node id and no unique
    /// state name. The edge is skipped.
    UnresolvedTarget {
        /// Node id of the state carrying the requisite.
        state: String,
        /// The `<state>.<name>` reference that could not be resolved.
        target: String,
    },

    /// Several states share the same `<state>.<name>`, so the name cannot
    /// be used to resolve requisites. References through that name are
    /// only honored when they match a node id directly.
    AmbiguousName {
        /// The shared `<state>.<name>` key.
        name: String,
        /// Node ids sharing the name, sorted.
        candidates: Vec<String>,
    },
}

impl Warning {
    /// Returns a human-readable description of the warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use stategraph_input::warning::Warning;
    ///
    /// let warning = Warning::AmbiguousName {
    ///     name: "file./etc/motd".to_string(),
    ///     candidates: vec!["file.motd".to_string(), "file.motd-fix".to_string()],
    /// };
    /// let desc = warning.description();
    /// assert!(desc.contains("file./etc/motd"));
    /// assert!(desc.contains("file.motd-fix"));
    /// ```
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::UnresolvedTarget { state, target } => {
                format!("{target}: node not found (required by {state})")
            }
            Self::AmbiguousName { name, candidates } => {
                format!(
                    "{name}: multiple mapping, so map ignored: {}",
                    candidates.join(", ")
                )
            }
        }
    }

    /// Returns a static string identifying the warning kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnresolvedTarget { .. } => "unresolved_target",
            Self::AmbiguousName { .. } => "ambiguous_name",
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for Warning {}
