//! Terminal output macros shared by both scan paths.
//!
//! Greppable mode silences everything that is not machine-parseable result
//! output; accessible mode keeps the text but drops color and prefix
//! decoration so screen readers are not fed glyph noise.

/// Progress and context lines, `[*]` prefixed.
#[macro_export]
macro_rules! detail {
    ($message:expr) => {
        $crate::detail!($message, false, false);
    };
    ($message:expr, $greppable:expr, $accessible:expr) => {
        if !$greppable {
            use colored::Colorize;
            if $accessible {
                println!("{}", $message);
            } else {
                println!("{} {}", "[*]".blue(), $message);
            }
        }
    };
}

/// Positive findings, `[+]` prefixed.
#[macro_export]
macro_rules! output {
    ($message:expr) => {
        $crate::output!($message, false, false);
    };
    ($message:expr, $greppable:expr, $accessible:expr) => {
        if !$greppable {
            use colored::Colorize;
            if $accessible {
                println!("{}", $message);
            } else {
                println!("{} {}", "[+]".green(), $message);
            }
        }
    };
}

/// Problems worth the user's attention, `[!]` prefixed.
#[macro_export]
macro_rules! warning {
    ($message:expr) => {
        $crate::warning!($message, false, false);
    };
    ($message:expr, $greppable:expr, $accessible:expr) => {
        if !$greppable {
            use colored::Colorize;
            if $accessible {
                eprintln!("{}", $message);
            } else {
                eprintln!("{} {}", "[!]".red(), $message);
            }
        }
    };
}
