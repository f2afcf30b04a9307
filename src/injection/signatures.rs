//! Static payload catalog and database error signature table.
//!
//! Both are configuration data handed to the scanner, never baked into the
//! scheduling machinery, so tests can swap in synthetic tables.

use once_cell::sync::Lazy;

/// One candidate payload. `destructive` marks payloads that can modify data
/// on a vulnerable target so callers can opt out of sending them.
#[derive(Debug, Clone, Copy)]
pub struct Payload {
    pub value: &'static str,
    pub destructive: bool,
}

/// The stock payload set: quote probe, boolean OR, UNION select, and a
/// destructive DROP TABLE kept for parity with classic tooling.
pub const DEFAULT_PAYLOADS: [Payload; 4] = [
    Payload {
        value: "'",
        destructive: false,
    },
    Payload {
        value: "' OR 1=1--",
        destructive: false,
    },
    Payload {
        value: "' UNION SELECT 1--",
        destructive: false,
    },
    Payload {
        value: "'; DROP TABLE users--",
        destructive: true,
    },
];

/// Materializes the stock payload set, optionally without the destructive
/// entries.
#[must_use]
pub fn default_payloads(include_destructive: bool) -> Vec<String> {
    DEFAULT_PAYLOADS
        .iter()
        .filter(|payload| include_destructive || !payload.destructive)
        .map(|payload| payload.value.to_owned())
        .collect()
}

/// Ordered table of database engines and the literal substrings known to
/// appear in their error output.
///
/// Classification walks entries in insertion order and the first engine with
/// any matching substring wins, so a body matching several engines always
/// classifies the same way.
#[derive(Debug, Clone)]
pub struct SignatureTable {
    entries: Vec<(String, Vec<String>)>,
}

impl SignatureTable {
    /// Builds a table from `(engine, substrings)` pairs. Substrings are
    /// matched case-insensitively against response bodies.
    #[must_use]
    pub fn new(entries: Vec<(&str, Vec<&str>)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(engine, patterns)| {
                    (
                        engine.to_owned(),
                        patterns
                            .into_iter()
                            .map(|pattern| pattern.to_lowercase())
                            .collect(),
                    )
                })
                .collect(),
        }
    }

    /// The built-in engine table.
    #[must_use]
    pub fn builtin() -> Self {
        BUILTIN_SIGNATURES.clone()
    }

    /// Returns the first engine whose any substring occurs in `body`, or
    /// `None` for a clean body. Presence of a substring is a heuristic, not
    /// proof of exploitability.
    #[must_use]
    pub fn classify(&self, body: &str) -> Option<&str> {
        let body = body.to_lowercase();

        self.entries
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|pattern| body.contains(pattern.as_str())))
            .map(|(engine, _)| engine.as_str())
    }
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::builtin()
    }
}

static BUILTIN_SIGNATURES: Lazy<SignatureTable> = Lazy::new(|| {
    SignatureTable::new(vec![
        ("mysql", vec!["mysql", "sql syntax", "mysql_fetch"]),
        ("postgresql", vec!["postgresql", "pg_query", "pg_exec"]),
        ("sqlite", vec!["sqlite", "sqlite3"]),
        ("mssql", vec!["sql server", "microsoft ole db", "odbc"]),
        ("oracle", vec!["oracle", "ora-", "oci_"]),
        (
            "generic",
            vec![
                "unclosed quotation",
                "quoted string not properly terminated",
                "syntax error",
            ],
        ),
    ])
});
