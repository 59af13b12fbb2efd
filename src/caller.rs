//! Caller attribution for log events
//!
//! Resolves the function name and source location of the code that issued a
//! log event, so sinks can annotate each line with its origin. Stack
//! inspection is inherently runtime-specific, so everything the rest of the
//! crate needs is behind two small operations:
//!
//! - [`resolve_caller`]: walk the stack `skip` frames above this module and
//!   report the frame's function name and file/line, if available.
//! - [`trim_location`] / [`short_function_name`]: deterministic display
//!   trimming of paths and fully qualified symbol names.
//!
//! Resolution is best-effort by contract. A skip offset beyond the stack
//! depth, an unresolvable frame, or missing debug info all yield `None`;
//! logging never fails because attribution did.

/// Default number of frames to skip so that resolution performed inside the
/// event formatter lands on the application call site rather than inside the
/// `tracing` dispatch machinery.
///
/// The correct value is sensitive to the call depth of the logging facade in
/// use. It is deliberately an explicit [`LogConfig`](crate::config::LogConfig)
/// field rather than a hidden constant; override it if attribution points at
/// the wrong frame in your build.
pub const DEFAULT_CALLER_SKIP: usize = 4;

/// Caller information resolved from the current stack.
///
/// Derived and ephemeral: attached as fields to a single outgoing log event,
/// never cached between events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCaller {
    /// Fully qualified function name, e.g. `xlog::builder::Builder::build`.
    pub function: String,
    /// Absolute source file path, when debug info provides one.
    pub file: Option<String>,
    /// Line number within `file`.
    pub line: Option<u32>,
}

impl ResolvedCaller {
    /// The trailing segment of the qualified function name.
    #[must_use]
    pub fn short_function(&self) -> &str {
        short_function_name(&self.function)
    }

    /// The file path trimmed to `segments` trailing components with the line
    /// number appended, or `None` when file or line are unavailable.
    #[must_use]
    pub fn location(&self, segments: usize) -> Option<String> {
        let file = self.file.as_deref()?;
        let line = self.line?;
        Some(trim_location(file, line, segments))
    }
}

/// Resolve the caller `skip` frames above this function's own frame.
///
/// A skip of 0 names the immediate caller of `resolve_caller`, 1 names that
/// function's caller, and so on. Returns `None` when the offset exceeds the
/// stack depth or the frame cannot be resolved.
///
/// Reads only the current thread's stack, performs no I/O, and holds no
/// locks, so it is safe to call concurrently from any number of threads.
pub fn resolve_caller(skip: usize) -> Option<ResolvedCaller> {
    let mut found_self = false;
    let mut remaining = skip;
    let mut resolved: Option<ResolvedCaller> = None;

    backtrace::trace(|frame| {
        let mut function: Option<String> = None;
        let mut file: Option<String> = None;
        let mut line: Option<u32> = None;

        backtrace::resolve_frame(frame, |symbol| {
            // A frame can resolve to several symbols when inlined; the first
            // one is the innermost and is the one we attribute to.
            if function.is_none() {
                if let Some(name) = symbol.name() {
                    function = Some(name.to_string());
                    file = symbol.filename().map(|p| p.display().to_string());
                    line = symbol.lineno();
                }
            }
        });

        // Frames below and including our own (the trace closure resolves to
        // `resolve_caller::{{closure}}`) are not counted against `skip`.
        let is_self = function.as_deref().is_some_and(is_resolver_frame);
        if is_self {
            found_self = true;
            return true;
        }
        if !found_self {
            return true;
        }
        if remaining > 0 {
            remaining -= 1;
            return true;
        }

        // An unresolvable frame at the requested offset ends the walk; we
        // report nothing rather than attribute to a deeper frame.
        resolved = function.map(|function| ResolvedCaller { function, file, line });
        false
    });

    resolved
}

/// Whether a symbol belongs to [`resolve_caller`] itself (including its trace
/// closure). Matched against the fully qualified path at a `::` boundary so
/// that application functions with `resolve_caller` in their name are still
/// counted as ordinary frames.
fn is_resolver_frame(name: &str) -> bool {
    const RESOLVER: &str = concat!(module_path!(), "::resolve_caller");
    match name.strip_prefix(RESOLVER) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

/// Reduce a fully qualified symbol name to its trailing segment.
///
/// Rust symbols have the form `crate::module::Type::method`, optionally
/// suffixed with a `::h<16 hex digits>` disambiguator. The hash is stripped,
/// the name is split on `::`, and the last meaningful segment is kept
/// (`{{closure}}` frames are skipped). Falls back to the whole name when
/// splitting yields nothing usable.
///
/// # Examples
///
/// ```
/// use xlog::caller::short_function_name;
///
/// assert_eq!(short_function_name("xlog::builder::Builder::build"), "build");
/// assert_eq!(short_function_name("main"), "main");
/// ```
#[must_use]
pub fn short_function_name(name: &str) -> &str {
    let name = strip_symbol_hash(name);
    name.rsplit("::")
        .find(|segment| !segment.is_empty() && *segment != "{{closure}}")
        .unwrap_or(name)
}

/// Strip the trailing `::h<16 hex>` symbol hash, if present.
fn strip_symbol_hash(name: &str) -> &str {
    if let Some((rest, hash)) = name.rsplit_once("::") {
        let mut chars = hash.chars();
        if hash.len() == 17
            && chars.next() == Some('h')
            && chars.all(|c| c.is_ascii_hexdigit())
        {
            return rest;
        }
    }
    name
}

/// Trim a source file path to its trailing `segments` components and append
/// the line number.
///
/// A width of 0 or 1 keeps only the bare file name. A path with fewer
/// components than requested is returned whole. Deterministic and
/// side-effect-free: identical inputs always render identically.
///
/// # Examples
///
/// ```
/// use xlog::caller::trim_location;
///
/// assert_eq!(trim_location("a/b/c/file.rs", 7, 1), "file.rs:7");
/// assert_eq!(trim_location("a/b/c/file.rs", 7, 2), "c/file.rs:7");
/// assert_eq!(trim_location("file.rs", 7, 3), "file.rs:7");
/// ```
#[must_use]
pub fn trim_location(file: &str, line: u32, segments: usize) -> String {
    let keep = segments.max(1);
    let parts: Vec<&str> = file.split('/').collect();
    let start = parts.len().saturating_sub(keep);
    format!("{}:{}", parts[start..].join("/"), line)
}
