use pseudo::lexer::lex;
use pseudo::{parse, run_source, Builtins, CapturedIo, Config, ErrorKind, MemoryFileSystem, PseudoError, Runtime};
use rstest::rstest;

fn run_with(source: &str, config: &Config) -> Result<Vec<String>, PseudoError> {
    let mut io = CapturedIo::new();
    let mut fs = MemoryFileSystem::new();
    run_source(source, config, &mut io, &mut fs)?;
    Ok(io.lines)
}

fn run(source: &str) -> Result<Vec<String>, PseudoError> {
    run_with(source, &Config::default())
}

fn output(source: &str) -> Vec<String> {
    match run(source) {
        Ok(lines) => lines,
        Err(err) => panic!("program failed: {} ({:?})", err.message, err.context),
    }
}

#[test]
fn declare_assign_output() {
    assert_eq!(output("DECLARE x : INTEGER\nx <- 5\nOUTPUT x"), vec!["5"]);
}

#[test]
fn output_concatenates_values() {
    assert_eq!(output("OUTPUT \"a\", 1, \"b\", TRUE"), vec!["a1bTRUE"]);
}

#[rstest]
#[case("OUTPUT 7 / 2", "3.5")]
#[case("OUTPUT 6 / 2", "3.0")]
#[case("OUTPUT 7 DIV 2", "3")]
#[case("OUTPUT 7 MOD 2", "1")]
#[case("OUTPUT 2 + 3 * 4", "14")]
#[case("OUTPUT (2 + 3) * 4", "20")]
#[case("OUTPUT -3 + 1", "-2")]
#[case("OUTPUT 1.5 + 1", "2.5")]
#[case("OUTPUT \"ab\" & \"cd\"", "abcd")]
#[case("OUTPUT 3 < 4 AND NOT (2 > 5)", "TRUE")]
#[case("OUTPUT \"apple\" < \"banana\"", "TRUE")]
#[case("OUTPUT 5 = 5.0", "TRUE")]
#[case("OUTPUT 4 <> 4", "FALSE")]
fn expressions(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(output(source), vec![expected]);
}

#[rstest]
#[case("OUTPUT 1 DIV 0")]
#[case("OUTPUT 1 MOD 0")]
#[case("OUTPUT 1 / 0")]
fn division_by_zero_fails(#[case] source: &str) {
    let err = run(source).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Runtime);
    assert!(err.message.contains("Division by zero"));
}

#[test]
fn integer_overflow_fails() {
    let err = run("DECLARE x : INTEGER\nx <- 9223372036854775807\nx <- x + 1").unwrap_err();
    assert!(err.message.contains("overflow"));
}

#[test]
fn if_else_chooses_branch() {
    let source = "DECLARE x : INTEGER\nx <- 3\nIF x > 2 THEN\n  OUTPUT \"big\"\nELSE\n  OUTPUT \"small\"\nENDIF";
    assert_eq!(output(source), vec!["big"]);
}

#[test]
fn then_on_its_own_line() {
    let source = "IF 1 > 2\n  THEN\n  OUTPUT \"yes\"\nELSE\n  OUTPUT \"no\"\nENDIF";
    assert_eq!(output(source), vec!["no"]);
}

#[test]
fn for_loop_counts_and_unbinds_its_variable() {
    assert_eq!(output("FOR i <- 1 TO 3\n  OUTPUT i\nNEXT i"), vec!["1", "2", "3"]);

    let err = run("FOR i <- 1 TO 3\n  OUTPUT i\nNEXT i\nOUTPUT i").unwrap_err();
    assert!(err.message.contains("Undeclared"));
}

#[test]
fn for_loop_with_negative_step() {
    assert_eq!(output("FOR i <- 10 TO 4 STEP -3\n  OUTPUT i\nNEXT i"), vec!["10", "7", "4"]);
}

#[test]
fn for_loop_that_never_runs() {
    assert!(output("FOR i <- 5 TO 1\n  OUTPUT i\nNEXT i").is_empty());
}

#[test]
fn for_loop_with_declaring_body_gets_fresh_scope() {
    let source = "FOR i <- 1 TO 2\n  DECLARE t : INTEGER\n  t <- i * 10\n  OUTPUT t\nNEXT i";
    assert_eq!(output(source), vec!["10", "20"]);
}

#[test]
fn for_loop_variable_is_read_only() {
    assert!(run("FOR i <- 1 TO 3\n  i <- 5\nNEXT i").is_err());
}

#[test]
fn zero_step_fails() {
    let err = run("FOR i <- 1 TO 3 STEP 0\n  OUTPUT i\nNEXT i").unwrap_err();
    assert!(err.message.contains("STEP"));
}

#[test]
fn while_and_repeat_loops() {
    let source = "\
DECLARE n : INTEGER
n <- 0
WHILE n < 3 DO
  n <- n + 1
ENDWHILE
OUTPUT n
REPEAT
  n <- n - 1
UNTIL n = 0
OUTPUT n";
    assert_eq!(output(source), vec!["3", "0"]);
}

#[rstest]
#[case(1, "one")]
#[case(3, "few")]
#[case(5, "few")]
#[case(9, "many")]
fn case_of_branches(#[case] value: i64, #[case] expected: &str) {
    let source = format!(
        "DECLARE x : INTEGER\nx <- {}\nCASE OF x\n  1 : OUTPUT \"one\"\n  2 TO 5 : OUTPUT \"few\"\n  OTHERWISE OUTPUT \"many\"\nENDCASE",
        value
    );
    assert_eq!(output(&source), vec![expected]);
}

#[test]
fn constants_cannot_be_assigned() {
    assert_eq!(output("CONSTANT Pi = 3.14\nOUTPUT Pi"), vec!["3.14"]);
    assert!(run("CONSTANT Limit <- 10\nLimit <- 11").is_err());
}

#[test]
fn uninitialized_reads_fail_without_defaults() {
    let mut config = Config::default();
    config.initialization.normal_variables_default = false;
    let err = run_with("DECLARE x : INTEGER\nOUTPUT x", &config).unwrap_err();
    assert!(err.message.contains("before it has a value"));

    assert_eq!(output("DECLARE x : INTEGER\nOUTPUT x"), vec!["0"]);
}

#[test]
fn assigning_wrong_type_fails() {
    let err = run("DECLARE x : INTEGER\nx <- \"five\"").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
}

#[test]
fn real_to_integer_depends_on_config() {
    assert!(run("DECLARE x : INTEGER\nx <- 2.7").is_err());

    let mut config = Config::default();
    config.coercion.real_to_int = true;
    assert_eq!(run_with("DECLARE x : INTEGER\nx <- 2.7\nOUTPUT x", &config).unwrap(), vec!["2"]);
}

#[test]
fn integer_widens_to_real() {
    assert_eq!(output("DECLARE r : REAL\nr <- 4\nOUTPUT r"), vec!["4.0"]);
}

/* ----- Arrays, records, enums, sets and pointers ----- */

#[test]
fn arrays_index_and_bounds() {
    let source = "\
DECLARE a : ARRAY[1:3] OF INTEGER
FOR i <- 1 TO 3
  a[i] <- i * i
NEXT i
OUTPUT a[2]
OUTPUT a";
    assert_eq!(output(source), vec!["4", "[1, 4, 9]"]);

    let err = run("DECLARE a : ARRAY[1:3] OF INTEGER\na[4] <- 1").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Runtime);
}

#[test]
fn two_dimensional_arrays() {
    let source = "DECLARE grid : ARRAY[1:2, 1:3] OF INTEGER\ngrid[2, 3] <- 7\nOUTPUT grid[2, 3]\nOUTPUT grid";
    assert_eq!(output(source), vec!["7", "[[0, 0, 0], [0, 0, 7]]"]);
}

#[test]
fn array_assignment_copies() {
    let source = "\
DECLARE a : ARRAY[1:2] OF INTEGER
DECLARE b : ARRAY[1:2] OF INTEGER
a[1] <- 1
b <- a
b[1] <- 99
OUTPUT a[1], \" \", b[1]";
    assert_eq!(output(source), vec!["1 99"]);
}

#[test]
fn records_have_value_semantics() {
    let source = "\
TYPE Point
  DECLARE x : INTEGER
  DECLARE y : INTEGER
ENDTYPE
DECLARE p : Point
DECLARE q : Point
p.x <- 3
p.y <- 4
q <- p
q.x <- 10
OUTPUT p.x * p.y
OUTPUT q.x";
    assert_eq!(output(source), vec!["12", "10"]);
}

#[test]
fn enums_compare_by_declaration_order() {
    let source = "\
TYPE Season = (Spring, Summer, Autumn, Winter)
DECLARE s : Season
s <- Summer
OUTPUT s
IF s < Autumn THEN
  OUTPUT \"early\"
ENDIF";
    assert_eq!(output(source), vec!["Summer", "early"]);
}

#[test]
fn pointers_write_through() {
    let source = "\
TYPE IntPointer = ^INTEGER
DECLARE x : INTEGER
DECLARE p : IntPointer
x <- 1
p <- ^x
p^ <- 42
OUTPUT x
OUTPUT p^ + 1";
    assert_eq!(output(source), vec!["42", "43"]);
}

#[test]
fn types_may_be_used_before_their_declaration() {
    let source = "\
DECLARE c : Colour
c <- Green
OUTPUT c
TYPE Colour = (Red, Green)";
    assert_eq!(output(source), vec!["Green"]);
}

#[test]
fn recursive_record_fails() {
    let err = run("TYPE Node\n  DECLARE next : Node\nENDTYPE").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
}

/* ----- Routines ----- */

#[test]
fn recursive_function() {
    let source = "\
FUNCTION Factorial(n : INTEGER) RETURNS INTEGER
  IF n <= 1 THEN
    RETURN 1
  ENDIF
  RETURN n * Factorial(n - 1)
ENDFUNCTION
OUTPUT Factorial(10)";
    assert_eq!(output(source), vec!["3628800"]);
}

#[test]
fn byref_and_byval_parameters() {
    let source = "\
PROCEDURE Swap(BYREF a : INTEGER, b : INTEGER)
  DECLARE t : INTEGER
  t <- a
  a <- b
  b <- t
ENDPROCEDURE
PROCEDURE Bump(BYVAL n : INTEGER)
  n <- n + 1
ENDPROCEDURE
DECLARE x : INTEGER
DECLARE y : INTEGER
x <- 1
y <- 2
CALL Swap(x, y)
OUTPUT x, \" \", y
CALL Bump(x)
OUTPUT x";
    assert_eq!(output(source), vec!["2 1", "2"]);
}

#[test]
fn procedures_and_functions_are_not_interchangeable() {
    assert!(run("PROCEDURE P()\nENDPROCEDURE\nOUTPUT P()").is_err());
    assert!(run("FUNCTION F() RETURNS INTEGER\n  RETURN 1\nENDFUNCTION\nCALL F()").is_err());
}

#[test]
fn function_without_return_fails() {
    let err = run("FUNCTION F() RETURNS INTEGER\nENDFUNCTION\nOUTPUT F()").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Runtime);
}

#[test]
fn builtin_names_are_reserved() {
    assert!(run("FUNCTION LENGTH(s : STRING) RETURNS INTEGER\n  RETURN 0\nENDFUNCTION").is_err());
}

#[test]
fn deep_recursion_exhausts_the_stack() {
    let mut config = Config::default();
    config.runtime.max_call_depth = 50;
    let source = "\
FUNCTION Down(n : INTEGER) RETURNS INTEGER
  RETURN Down(n + 1)
ENDFUNCTION
OUTPUT Down(0)";
    let err = run_with(source, &config).unwrap_err();
    assert_eq!(err.kind, ErrorKind::StackOverflow);
    assert_eq!(err.code, "E_STACK");
}

#[test]
fn default_call_depth_is_reached_without_crashing() {
    let source = "\
FUNCTION Down(n : INTEGER) RETURNS INTEGER
  RETURN Down(n + 1)
ENDFUNCTION
OUTPUT Down(0)";
    let err = run(source).unwrap_err();
    assert_eq!(err.code, "E_STACK");
}

#[test]
fn recursion_below_the_default_limit_finishes() {
    let source = "\
FUNCTION Depth(n : INTEGER) RETURNS INTEGER
  IF n = 0 THEN
    RETURN 0
  ENDIF
  RETURN 1 + Depth(n - 1)
ENDFUNCTION
OUTPUT Depth(190)";
    assert_eq!(output(source), vec!["190"]);
}

#[test]
fn deeply_nested_parentheses_are_a_parse_error() {
    let source = format!("OUTPUT {}1{}", "(".repeat(3000), ")".repeat(3000));
    let err = run(&source).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
}

#[test]
fn runtime_on_the_callers_stack_stops_at_its_budget() {
    let config = Config::default();
    let tokens = lex(
        "PROCEDURE Down(n : INTEGER)\n  CALL Down(n + 1)\nENDPROCEDURE\nCALL Down(0)",
        &config,
    )
    .unwrap();
    let program = parse(&tokens, &config).unwrap();
    let builtins = Builtins::standard();
    let mut io = CapturedIo::new();
    let mut fs = MemoryFileSystem::new();

    let err = Runtime::new(&config, &builtins, &mut io, &mut fs)
        .run(&program)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::StackOverflow);
}

#[test]
fn statement_limit_stops_infinite_loops() {
    let mut config = Config::default();
    config.runtime.max_statements = 1_000;
    let err = run_with("WHILE TRUE\nENDWHILE", &config).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Limit);
}

/* ----- Builtins ----- */

#[rstest]
#[case("OUTPUT LENGTH(\"hello\")", "5")]
#[case("OUTPUT MID(\"hello\", 2, 3)", "ell")]
#[case("OUTPUT LEFT(\"hello\", 2)", "he")]
#[case("OUTPUT RIGHT(\"hello\", 3)", "llo")]
#[case("OUTPUT TO_UPPER(\"abc\")", "ABC")]
#[case("OUTPUT INT(3.9)", "3")]
#[case("OUTPUT SQRT(16)", "4.0")]
fn builtin_calls(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(output(source), vec![expected]);
}

#[test]
fn random_between_stays_in_range() {
    let lines = output("FOR i <- 1 TO 20\n  OUTPUT RANDOMBETWEEN(3, 5)\nNEXT i");
    for line in lines {
        let n: i64 = line.parse().unwrap();
        assert!((3..=5).contains(&n));
    }
}

/* ----- Input ----- */

#[test]
fn input_parses_by_target_type() {
    let mut io = CapturedIo::new().with_inputs(["7", "2.5", "TRUE"]);
    let mut fs = MemoryFileSystem::new();
    let source = "\
DECLARE n : INTEGER
DECLARE r : REAL
DECLARE b : BOOLEAN
INPUT n
INPUT r
INPUT b
OUTPUT n * 2, \" \", r, \" \", NOT b";
    run_source(source, &Config::default(), &mut io, &mut fs).unwrap();
    assert_eq!(io.lines, vec!["14 2.5 FALSE"]);
    assert_eq!(io.prompts[0], "Enter the value for \"n\"");
}

#[test]
fn invalid_input_fails() {
    let mut io = CapturedIo::new().with_inputs(["seven"]);
    let mut fs = MemoryFileSystem::new();
    let result = run_source("DECLARE n : INTEGER\nINPUT n", &Config::default(), &mut io, &mut fs);
    assert!(result.is_err());
}

/* ----- Classes ----- */

const COUNTER: &str = "\
CLASS Counter
  PRIVATE count : INTEGER
  PUBLIC PROCEDURE NEW(start : INTEGER)
    count <- start
  ENDPROCEDURE
  PUBLIC PROCEDURE Increment()
    count <- count + 1
  ENDPROCEDURE
  PUBLIC FUNCTION Current() RETURNS INTEGER
    RETURN count
  ENDFUNCTION
ENDCLASS
";

#[test]
fn class_construction_and_methods() {
    let source = format!(
        "{}DECLARE c : Counter\nc <- NEW Counter(5)\nCALL c.Increment()\nCALL c.Increment()\nOUTPUT c.Current()",
        COUNTER
    );
    assert_eq!(output(&source), vec!["7"]);
}

#[test]
fn private_properties_are_hidden() {
    let source = format!("{}DECLARE c : Counter\nc <- NEW Counter(5)\nOUTPUT c.count", COUNTER);
    assert!(run(&source).is_err());
}

#[test]
fn inheritance_and_super() {
    let source = "\
CLASS Animal
  PUBLIC name : STRING
  PUBLIC PROCEDURE NEW(n : STRING)
    name <- n
  ENDPROCEDURE
  PUBLIC FUNCTION Speak() RETURNS STRING
    RETURN name & \" makes a sound\"
  ENDFUNCTION
ENDCLASS
CLASS Dog INHERITS Animal
  PUBLIC FUNCTION Speak() RETURNS STRING
    RETURN SUPER.Speak() & \" (woof)\"
  ENDFUNCTION
ENDCLASS
DECLARE d : Dog
d <- NEW Dog(\"Rex\")
OUTPUT d.Speak()
OUTPUT d.name";
    assert_eq!(output(source), vec!["Rex makes a sound (woof)", "Rex"]);
}

#[test]
fn incompatible_override_fails() {
    let source = "\
CLASS A
  PUBLIC FUNCTION F(x : INTEGER) RETURNS INTEGER
    RETURN x
  ENDFUNCTION
ENDCLASS
CLASS B INHERITS A
  PUBLIC FUNCTION F(x : STRING) RETURNS INTEGER
    RETURN 0
  ENDFUNCTION
ENDCLASS";
    let err = run(source).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
}

#[test]
fn error_carries_call_context() {
    let source = "\
PROCEDURE Broken()
  OUTPUT 1 DIV 0
ENDPROCEDURE
CALL Broken()";
    let err = run(source).unwrap_err();
    assert!(err.context.iter().any(|frame| frame.contains("Broken")));
}
