#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Declare a pattern rule for a [`Script`](crate::Script).
///
/// ```
/// use charge::{rule, Declaration};
///
/// let decl: Declaration = rule! {
///     name: "greet",
///     pattern: "hello *",
///     weight: 2,
///     reply: |turn| { Ok(format!("hi {}", turn.group(0).unwrap_or("there"))) }
/// };
/// assert!(matches!(decl, Declaration::Pattern(_)));
/// ```
#[macro_export]
macro_rules! rule {
    (
        name: $name:expr,
        pattern: $pattern:expr
        $(, previous: $previous:expr)?
        $(, weight: $weight:expr)?
        , reply: |$turn:ident| $body:block
        $(,)?
    ) => {{
        $crate::Declaration::Pattern($crate::RuleSpec {
            name: ($name).to_string(),
            pattern: ($pattern).to_string(),
            previous: { let _p = ""; $( let _p = $previous; )? _p.to_string() },
            weight: { 0 $(+ $weight)? },
            handler: $crate::handler(move |$turn: &mut $crate::Turn<'_>| {
                let result: ::std::result::Result<String, $crate::HandlerError> = $body;
                result
            }),
        })
    }};
}
