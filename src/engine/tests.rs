use crate::{
    Config, DEBUG_KEY, Declaration, DirectorySource, Engine, HandlerError, LoadIssue, Outcome, RuleSpec, Script,
    ScriptLoadError, ScriptRegistry, TOPIC_KEY, Value, handler,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A script that declares a fixed list of declarations.
struct Fixed {
    name: String,
    topic: String,
    declarations: Vec<Declaration>,
}

impl Script for Fixed {
    fn name(&self) -> &str {
        &self.name
    }

    fn topic(&self) -> &str {
        &self.topic
    }

    fn declare(&self) -> Vec<Declaration> {
        self.declarations.clone()
    }
}

fn registry(scripts: Vec<(&str, &str, Vec<Declaration>)>) -> ScriptRegistry {
    let mut registry = ScriptRegistry::new();
    for (name, topic, declarations) in scripts {
        let (name, topic) = (name.to_string(), topic.to_string());
        registry.register_with(move || {
            Ok(Box::new(Fixed { name: name.clone(), topic: topic.clone(), declarations: declarations.clone() })
                as Box<dyn Script>)
        });
    }
    registry
}

fn engine_with(declarations: Vec<Declaration>) -> Engine {
    let mut engine = Engine::new(Config::default().quiet());
    engine.load_scripts(&registry(vec![("test", "all", declarations)]));
    engine
}

fn fixed(name: &str, pattern: &str, weight: i32, text: &'static str) -> Declaration {
    rule! { name: name, pattern: pattern, weight: weight, reply: |_turn| { Ok(text.to_string()) } }
}

#[test]
fn higher_weight_wins_regardless_of_order() {
    for flipped in [false, true] {
        let mut decls = vec![fixed("three", "hello *", 3, "three"), fixed("five", "* world", 5, "five")];
        if flipped {
            decls.reverse();
        }
        let mut engine = engine_with(decls);
        assert_eq!(engine.reply("u", "hello world"), "five", "flipped={flipped}");
    }
}

#[test]
fn more_specific_pattern_wins_at_equal_weight() {
    let mut engine = engine_with(vec![
        fixed("loose", "i like *", 0, "loose"),
        fixed("exact", "i like the red house", 0, "exact"),
    ]);

    assert_eq!(engine.reply("u", "I like the red house!"), "exact");
    assert_eq!(engine.reply("u", "I like trains"), "loose");
}

#[test]
fn equal_priority_keeps_load_order() {
    let mut engine = engine_with(vec![fixed("first", "a *", 0, "first"), fixed("second", "* b", 0, "second")]);
    assert_eq!(engine.reply("u", "a b"), "first");
}

#[test]
fn wildcard_capture_is_passed_to_handler() {
    let mut engine = engine_with(vec![rule! {
        name: "hello",
        pattern: "hello *",
        reply: |turn| { Ok(format!("You said hello to {}", turn.require(0)?)) }
    }]);

    assert_eq!(engine.reply("alice", "Hello, Big World!"), "You said hello to big world");
    assert_eq!(engine.reply("alice", "hello"), "");
}

#[test]
fn self_recursion_stops_at_depth_limit() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let decl = Declaration::Pattern(RuleSpec {
        name: "loop".into(),
        pattern: "again".into(),
        previous: String::new(),
        weight: 0,
        handler: handler(move |turn| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(turn.reply("again"))
        }),
    });

    let mut engine = Engine::new(Config::default().quiet().with_depth_limit(5));
    engine.load_scripts(&registry(vec![("test", "all", vec![decl])]));

    assert_eq!(engine.reply("u", "again"), "");
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[test]
fn nested_reply_reaches_other_rule() {
    let mut engine = engine_with(vec![
        fixed("hello", "hello", 0, "Hi there."),
        rule! { name: "hey", pattern: "hey", reply: |turn| { Ok(format!("{} Welcome back.", turn.reply("hello"))) } },
    ]);

    assert_eq!(engine.reply("u", "Hey!"), "Hi there. Welcome back.");
}

#[test]
fn depth_exceeded_outcome() {
    let mut engine = engine_with(vec![rule! {
        name: "deep",
        pattern: "deep",
        reply: |turn| { Ok(format!("depth {}", turn.depth())) }
    }]);

    let zero = Engine::new(Config::default().quiet().with_depth_limit(0)).reply_verbose("u", "deep");
    assert_eq!(zero.outcome, Outcome::DepthExceeded);
    assert_eq!(zero.reply, "");

    assert_eq!(engine.reply("u", "deep"), "depth 0");
}

#[test]
fn duplicate_pattern_with_other_handler_is_reported() {
    let mut engine = Engine::new(Config::default().quiet());
    let report = engine.load_scripts(&registry(vec![
        ("first", "all", vec![fixed("greet", "hello *", 0, "first")]),
        ("second", "all", vec![fixed("greet", "hello   *", 4, "second")]),
    ]));

    assert_eq!(report.rules, 1);
    assert!(matches!(
        report.issues.as_slice(),
        [LoadIssue::DuplicateRule { existing, rule, .. }] if existing == "first.greet" && rule == "second.greet"
    ));
    assert_eq!(engine.reply("u", "hello you"), "first");
}

#[test]
fn duplicate_pattern_with_same_handler_is_silent() {
    let shared = handler(|_| Ok("shared".to_string()));
    let spec = |name: &str| {
        Declaration::Pattern(RuleSpec {
            name: name.to_string(),
            pattern: "hi".into(),
            previous: String::new(),
            weight: 0,
            handler: shared.clone(),
        })
    };

    let mut engine = Engine::new(Config::default().quiet());
    let report = engine.load_scripts(&registry(vec![("a", "all", vec![spec("one")]), ("b", "all", vec![spec("two")])]));

    assert!(report.is_clean(), "{:?}", report.issues);
    assert_eq!(report.rules, 1);
    assert_eq!(engine.reply("u", "hi"), "shared");
}

#[test]
fn substitutions_apply_before_matching() {
    let config = Config::default().quiet().with_substitution("I'm", "i am");
    let mut engine = Engine::new(config);
    engine.load_scripts(&registry(vec![(
        "feelings",
        "all",
        vec![rule! { name: "am", pattern: "i am *", reply: |turn| { Ok(format!("Why are you {}?", turn.require(0)?)) } }],
    )]));

    assert_eq!(engine.reply("u", "I'm tired today!"), "Why are you tired today?");

    engine.add_substitution("u", "you");
    engine.load_scripts(&registry(vec![("s", "all", vec![fixed("thanks", "thank you", 0, "Any time.")])]));
    assert_eq!(engine.reply("u", "thank U"), "Any time.");
}

#[test]
fn no_scripts_means_no_rules_and_empty_replies() {
    let mut engine = Engine::new(Config::default().quiet());
    let report = engine.load_scripts(&ScriptRegistry::new());

    assert_eq!(report.scripts, 0);
    assert!(matches!(report.issues.as_slice(), [LoadIssue::NoRules(_)]));
    assert_eq!(engine.topic_names(), vec!["all"]);

    let details = engine.reply_verbose("u", "anything at all");
    assert_eq!(details.reply, "");
    assert_eq!(details.outcome, Outcome::NoMatch);
    assert_eq!(details.considered, 0);
}

#[test]
fn bad_pattern_is_reported_and_skipped() {
    let mut engine = Engine::new(Config::default().quiet());
    let report = engine.load_scripts(&registry(vec![(
        "s",
        "all",
        vec![fixed("upper", "Hello", 0, "never"), fixed("ok", "hello", 0, "fine")],
    )]));

    assert_eq!(report.rules, 1);
    assert!(matches!(report.issues.as_slice(), [LoadIssue::Rule(err)] if err.rule == "s.upper"));
    assert_eq!(engine.reply("u", "hello"), "fine");
}

#[test]
fn unknown_alternate_in_previous_never_matches() {
    let mut engine = engine_with(vec![
        rule! { name: "odd", pattern: "yes", previous: "%a:nothing", weight: 10, reply: |_turn| { Ok("odd".into()) } },
        fixed("plain", "yes", 0, "plain"),
    ]);

    let table = engine.rule_table();
    let odd = table.iter().find(|row| row.rule == "test.odd").unwrap();
    assert!(!odd.cached);
    assert_eq!(engine.reply("u", "yes"), "plain");
}

#[test]
fn builtin_and_added_alternates() {
    let mut engine = engine_with(vec![
        rule! { name: "color", pattern: "i like %a:colors", reply: |turn| { Ok(format!("{} is nice", turn.require(0)?)) } },
        rule! { name: "pet", pattern: "i have a %a:pets", reply: |turn| { Ok(format!("a {}!", turn.require(0)?)) } },
    ]);

    assert_eq!(engine.reply("u", "I like green."), "green is nice");
    assert_eq!(engine.reply("u", "I like purple."), "");
    assert_eq!(engine.reply("u", "I have a dog"), "");

    engine.add_alternate("all", "pets", "(dog|cat)");
    assert_eq!(engine.reply("u", "I have a dog"), "a dog!");
}

#[test]
fn recursive_alternate_leaves_rule_uncompiled() {
    let mut engine = engine_with(vec![
        rule! { name: "loop", pattern: "i like %a:loop", weight: 1, reply: |_turn| { Ok("loop".into()) } },
        fixed("hi", "hi", 0, "hello"),
    ]);
    engine.add_alternate("all", "loop", "(a|%a:loop)");

    assert_eq!(engine.reply("u", "hi"), "hello");
    assert_eq!(engine.reply("u", "i like a"), "");
    let table = engine.rule_table();
    assert!(table.iter().any(|row| row.rule == "test.loop" && !row.cached));
}

#[test]
fn handler_error_stops_the_scan() {
    let mut engine = engine_with(vec![
        rule! { name: "broken", pattern: "help *", weight: 1, reply: |_turn| { Err(HandlerError::Failed("boom".into())) } },
        fixed("fallback", "*", 0, "fallback"),
    ]);

    let details = engine.reply_verbose("u", "help me");
    assert_eq!(details.reply, "");
    assert_eq!(details.outcome, Outcome::HandlerFailed);
    assert_eq!(details.rule.as_deref(), Some("test.broken"));

    assert_eq!(engine.reply("u", "something else"), "fallback");
}

#[test]
fn unknown_topic_falls_back_to_all() {
    let mut engine = engine_with(vec![fixed("hi", "hi", 0, "hello")]);
    engine.set_topic("bob", "nowhere");
    assert_eq!(engine.topic_of("bob"), Some("nowhere"));

    assert_eq!(engine.reply("bob", "hi"), "hello");
    assert_eq!(engine.topic_of("bob"), Some("all"));
}

#[test]
fn replies_come_from_all_even_in_another_topic() {
    let mut engine = Engine::new(Config::default().quiet());
    engine.load_scripts(&registry(vec![
        ("general", "all", vec![fixed("hi", "hi", 0, "from all")]),
        ("games", "games", vec![fixed("hi", "hi", 9, "from games")]),
    ]));
    assert_eq!(engine.topic_names(), vec!["all", "games"]);

    engine.set_topic("u", "games");
    assert_eq!(engine.reply("u", "hi"), "from all");
    assert_eq!(engine.topic_of("u"), Some("games"));
}

#[test]
fn alternate_and_substitute_declarations_are_unsupported() {
    let mut engine = Engine::new(Config::default().quiet());
    let report = engine.load_scripts(&registry(vec![(
        "s",
        "all",
        vec![
            Declaration::Alternate { name: "fruit".into(), value: "(apple|pear)".into() },
            Declaration::Substitute { word: "u".into(), replacement: "you".into() },
            fixed("ok", "ok", 0, "ok"),
        ],
    )]));

    let kinds: Vec<&str> = report
        .issues
        .iter()
        .filter_map(|issue| match issue {
            LoadIssue::Unsupported { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec!["alternate", "substitute"]);
    assert!(engine.topic("all").is_some_and(|t| !t.alternates().contains_key("fruit")));
}

#[test]
fn script_failure_does_not_stop_loading() {
    let mut registry = registry(vec![("good", "all", vec![fixed("hi", "hi", 0, "hello")])]);
    registry.register_with(|| Err(ScriptLoadError::Instantiate { name: "bad".into(), message: "no".into() }));

    let mut engine = Engine::new(Config::default().quiet());
    let report = engine.load_scripts(&registry);

    assert_eq!(report.scripts, 1);
    assert!(matches!(report.issues.as_slice(), [LoadIssue::Script(_)]));
    assert_eq!(engine.reply("u", "hi"), "hello");
}

#[test]
fn reload_replaces_rules_and_keeps_vars() {
    let mut engine = engine_with(vec![fixed("old", "old", 0, "old")]);
    engine.uservars_mut("u").insert("name".into(), Value::from("Ann"));

    engine.load_scripts(&registry(vec![("s", "all", vec![fixed("new", "new", 0, "new")])]));

    assert_eq!(engine.reply("u", "old"), "");
    assert_eq!(engine.reply("u", "new"), "new");
    assert_eq!(engine.uservars("u").and_then(|v| v.get("name")), Some(&Value::from("Ann")));
}

#[test]
fn handlers_share_vars_and_move_topics() {
    let mut engine = engine_with(vec![
        rule! {
            name: "name",
            pattern: "my name is *",
            reply: |turn| {
                let name = turn.require(0)?.to_string();
                turn.uservars_mut().insert("name".into(), Value::from(name.clone()));
                let seen = turn.botvars().get("seen").and_then(Value::as_u64).unwrap_or(0);
                turn.botvars_mut().insert("seen".into(), Value::from(seen + 1));
                turn.set_topic("games");
                Ok(format!("Nice to meet you, {name}."))
            }
        },
        rule! {
            name: "who",
            pattern: "who am i",
            reply: |turn| {
                let name = turn.uservars().get("name").and_then(Value::as_str).unwrap_or("nobody").to_string();
                Ok(format!("{name}, in {}", turn.topic()))
            }
        },
    ]);

    assert_eq!(engine.reply("ann", "My name is Ann"), "Nice to meet you, ann.");
    assert_eq!(engine.uservars("ann").and_then(|v| v.get(TOPIC_KEY)), Some(&Value::from("games")));

    // "games" has no rules loaded, so the next message moves ann back to "all".
    assert_eq!(engine.reply("ann", "who am i"), "ann, in all");
    assert_eq!(engine.reply("bob", "who am i"), "nobody, in all");
    engine.reply("bob", "my name is bob");
    assert_eq!(engine.botvars().get("seen"), Some(&Value::from(2u64)));
}

#[test]
fn previous_reply_precondition() {
    let mut engine = engine_with(vec![
        fixed("ask", "ask me", 0, "Do you like cheese?"),
        rule! { name: "agree", pattern: "yes", previous: "do you like *", reply: |_turn| { Ok("Me too!".into()) } },
        fixed("yes", "yes", 0, "Yes what?"),
    ]);

    assert_eq!(engine.reply("u", "yes"), "Yes what?");
    assert_eq!(engine.reply("u", "ask me"), "Do you like cheese?");
    assert_eq!(engine.reply("u", "Yes!"), "Me too!");
    assert_eq!(engine.reply("u", "yes"), "Yes what?");

    // Another user's conversation is separate.
    engine.reply("a", "ask me");
    assert_eq!(engine.reply("b", "yes"), "Yes what?");
}

#[test]
fn debug_botvar_reflects_config() {
    let quiet = Engine::new(Config::default().quiet());
    assert_eq!(quiet.botvars().get(DEBUG_KEY), Some(&Value::from("False")));

    let mut noisy = Engine::new(Config::default().quiet().with_debug(true));
    assert_eq!(noisy.botvars().get(DEBUG_KEY), Some(&Value::from("True")));
    assert!(!noisy.debug_enabled());

    noisy.config.debug_log = true;
    assert!(noisy.debug_enabled());
    noisy.botvars_mut().insert(DEBUG_KEY.into(), Value::from("False"));
    assert!(!noisy.debug_enabled());
}

#[test]
fn build_cache_is_idempotent() {
    let mut engine = engine_with(vec![fixed("a", "a", 1, "a"), fixed("b", "b *", 2, "b")]);

    engine.build_cache();
    let first = engine.rule_table();
    engine.build_cache();
    assert_eq!(engine.rule_table(), first);

    let order: Vec<&str> = first.iter().map(|row| row.rule.as_str()).collect();
    assert_eq!(order, vec!["test.b", "test.a"]);
    assert!(first.iter().all(|row| row.cached));
}

#[test]
fn reply_verbose_reports_the_match() {
    let mut engine = engine_with(vec![fixed("x", "x *", 1, "X"), fixed("any", "*", 0, "any")]);

    let details = engine.reply_verbose("u", "Y z");
    assert_eq!(details.outcome, Outcome::Replied);
    assert_eq!(details.normalized, "y z");
    assert_eq!(details.rule.as_deref(), Some("test.any"));
    assert_eq!(details.considered, 2);
    assert_eq!(details.depth, 0);
}

#[test]
fn reset_user_forgets_state() {
    let mut engine = engine_with(vec![fixed("hi", "hi", 0, "hello")]);
    engine.reply("u", "hi");
    assert!(engine.uservars("u").is_some());

    assert!(engine.reset_user("u"));
    assert!(!engine.reset_user("u"));
    assert!(engine.uservars("u").is_none());

    engine.reply("v", "hi");
    engine.reset_users();
    assert!(engine.uservars("v").is_none());
}

#[test]
fn json_scripts_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("greetings.json"),
        r#"{
            "botvars": {"name": "Charge"},
            "rules": [
                {"name": "hello", "pattern": "hello *", "reply": "Hi {0}."},
                {"name": "hey", "pattern": "hey *", "redirect": "hello {0}"},
                {"pattern": "(hi|yo) *", "weight": -1, "reply": "{0} {1}"}
            ]
        }"#,
    )
    .unwrap();

    let mut engine = Engine::new(Config::default().quiet());
    let report = engine.load_scripts(&DirectorySource::new(dir.path()));

    assert!(report.is_clean(), "{:?}", report.issues);
    assert_eq!(report.rules, 3);
    assert_eq!(engine.botvars().get("name"), Some(&Value::from("Charge")));
    assert_eq!(engine.reply("u", "Hello Ann"), "Hi ann.");
    assert_eq!(engine.reply("u", "hey Bo"), "Hi bo.");
    assert_eq!(engine.reply("u", "yo there"), "yo there");
}
