use proptest::prelude::*;

use pseudo::lexer::lex;
use pseudo::{run_source, symbolize, CapturedIo, Config, MemoryFileSystem};

fn run(source: &str) -> Vec<String> {
    let mut io = CapturedIo::new();
    let mut fs = MemoryFileSystem::new();
    match run_source(source, &Config::default(), &mut io, &mut fs) {
        Ok(()) => io.lines,
        Err(err) => panic!("{}: {}", source, err.message),
    }
}

proptest! {
    #[test]
    fn symbols_cover_the_source(source in "\\PC{0,60}") {
        let symbols = symbolize(&source);
        let joined: String = symbols.iter().map(|s| s.text.as_str()).collect();
        prop_assert_eq!(joined, source);
    }

    #[test]
    fn lexing_never_panics(source in "\\PC{0,60}") {
        let _ = lex(&source, &Config::default());
    }

    #[test]
    fn token_text_relexes_to_the_same_kind(source in "[a-zA-Z0-9 +*<>=\"'\\\\(),.-]{0,40}") {
        let config = Config::default();
        if let Ok(tokens) = lex(&source, &config) {
            for token in tokens {
                let again = lex(&token.fmt_text(), &config).unwrap();
                prop_assert_eq!(again.len(), 1);
                prop_assert_eq!(again[0].kind, token.kind);
                prop_assert_eq!(&again[0].text, &token.text);
            }
        }
    }

    #[test]
    fn integer_arithmetic_matches_i64(a in -10_000i64..10_000, b in -10_000i64..10_000) {
        let source = format!(
            "DECLARE a : INTEGER\nDECLARE b : INTEGER\na <- {}\nb <- {}\nOUTPUT a + b\nOUTPUT a - b\nOUTPUT a * b",
            a, b
        );
        let lines = run(&source);
        prop_assert_eq!(&lines[0], &(a + b).to_string());
        prop_assert_eq!(&lines[1], &(a - b).to_string());
        prop_assert_eq!(&lines[2], &(a * b).to_string());
    }

    #[test]
    fn div_and_mod_truncate(a in -10_000i64..10_000, b in 1i64..100) {
        let source = format!("DECLARE a : INTEGER\na <- {}\nOUTPUT a DIV {}\nOUTPUT a MOD {}", a, b, b);
        let lines = run(&source);
        prop_assert_eq!(&lines[0], &(a / b).to_string());
        prop_assert_eq!(&lines[1], &(a % b).to_string());
    }

    #[test]
    fn for_loop_runs_expected_times(start in -20i64..20, end in -20i64..20, step in 1i64..5) {
        let source = format!(
            "DECLARE n : INTEGER\nn <- 0\nFOR i <- {} TO {} STEP {}\n  n <- n + 1\nNEXT i\nOUTPUT n",
            start, end, step
        );
        let expected = if start <= end { (end - start) / step + 1 } else { 0 };
        prop_assert_eq!(run(&source), vec![expected.to_string()]);
    }
}
