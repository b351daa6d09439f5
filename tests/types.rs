use pseudo::types::compat::{types_assignable, types_equal};
use pseudo::types::TypeArena;
use pseudo::{run_source, CapturedIo, Config, ErrorKind, MemoryFileSystem, PResult};
use rstest::rstest;

fn run_with(source: &str, config: &Config) -> PResult<Vec<String>> {
    let mut io = CapturedIo::new();
    let mut fs = MemoryFileSystem::new();
    run_source(source, config, &mut io, &mut fs)?;
    Ok(io.lines)
}

#[rstest]
#[case(false, false, false)]
#[case(true, false, true)]
#[case(false, true, true)]
fn shifted_arrays_need_a_lenient_config(#[case] same_length: bool, #[case] same_total: bool, #[case] expected: bool) {
    let mut arena = TypeArena::new();
    let one_based = arena.array(TypeArena::INTEGER, Some(vec![(1, 10)]));
    let zero_based = arena.array(TypeArena::INTEGER, Some(vec![(0, 9)]));

    let mut config = Config::default();
    config.coercion.arrays_same_length = same_length;
    config.coercion.arrays_same_total_size = same_total;
    assert_eq!(types_assignable(&arena, &config, one_based, zero_based).is_ok(), expected);
}

#[test]
fn reshaped_arrays_need_same_total_size() {
    let mut arena = TypeArena::new();
    let flat = arena.array(TypeArena::INTEGER, Some(vec![(1, 6)]));
    let grid = arena.array(TypeArena::INTEGER, Some(vec![(1, 2), (1, 3)]));

    let mut config = Config::default();
    config.coercion.arrays_same_length = true;
    assert!(types_assignable(&arena, &config, flat, grid).is_err());

    config.coercion.arrays_same_total_size = true;
    assert!(types_assignable(&arena, &config, flat, grid).is_ok());
}

#[test]
fn array_elements_are_invariant() {
    let mut arena = TypeArena::new();
    let ints = arena.array(TypeArena::INTEGER, Some(vec![(1, 3)]));
    let reals = arena.array(TypeArena::REAL, Some(vec![(1, 3)]));
    assert!(types_assignable(&arena, &Config::default(), reals, ints).is_err());
    assert!(!types_equal(&arena, reals, ints));
}

#[test]
fn equal_arrays_are_interned() {
    let mut arena = TypeArena::new();
    let a = arena.array(TypeArena::CHAR, Some(vec![(1, 4)]));
    let b = arena.array(TypeArena::CHAR, Some(vec![(1, 4)]));
    assert_eq!(a, b);
    assert!(types_equal(&arena, a, b));
}

#[test]
fn array_assignment_follows_config_at_runtime() {
    let source = "\
DECLARE a : ARRAY[1:3] OF INTEGER
DECLARE b : ARRAY[0:2] OF INTEGER
b[0] <- 5
a <- b
OUTPUT a[1]";
    let err = run_with(source, &Config::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err.help.is_some());

    let mut config = Config::default();
    config.coercion.arrays_same_length = true;
    assert_eq!(run_with(source, &config).unwrap(), vec!["5"]);
}

const HIERARCHY: &str = "\
CLASS Animal
  PUBLIC PROCEDURE Describe()
  ENDPROCEDURE
ENDCLASS
CLASS Dog INHERITS Animal
ENDCLASS
";

#[test]
fn override_may_widen_a_parameter() {
    let source = format!(
        "{}CLASS Vet\n  PUBLIC PROCEDURE Treat(patient : Dog)\n  ENDPROCEDURE\nENDCLASS\n\
CLASS AnyVet INHERITS Vet\n  PUBLIC PROCEDURE Treat(patient : Animal)\n  ENDPROCEDURE\nENDCLASS\nOUTPUT \"ok\"",
        HIERARCHY
    );
    assert_eq!(run_with(&source, &Config::default()).unwrap(), vec!["ok"]);
}

#[test]
fn override_may_not_narrow_a_parameter() {
    let source = format!(
        "{}CLASS Vet\n  PUBLIC PROCEDURE Treat(patient : Animal)\n  ENDPROCEDURE\nENDCLASS\n\
CLASS DogVet INHERITS Vet\n  PUBLIC PROCEDURE Treat(patient : Dog)\n  ENDPROCEDURE\nENDCLASS",
        HIERARCHY
    );
    let err = run_with(&source, &Config::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err.message.contains("Treat"));
}

#[test]
fn override_may_narrow_a_return_type() {
    let source = format!(
        "{}CLASS Shelter\n  PUBLIC FUNCTION Adopt() RETURNS Animal\n    RETURN NEW Animal()\n  ENDFUNCTION\nENDCLASS\n\
CLASS Kennel INHERITS Shelter\n  PUBLIC FUNCTION Adopt() RETURNS Dog\n    RETURN NEW Dog()\n  ENDFUNCTION\nENDCLASS\nOUTPUT \"ok\"",
        HIERARCHY
    );
    assert_eq!(run_with(&source, &Config::default()).unwrap(), vec!["ok"]);
}

#[test]
fn override_must_keep_access() {
    let source = "\
CLASS A
  PUBLIC PROCEDURE Run()
  ENDPROCEDURE
ENDCLASS
CLASS B INHERITS A
  PRIVATE PROCEDURE Run()
  ENDPROCEDURE
ENDCLASS";
    assert_eq!(run_with(source, &Config::default()).unwrap_err().kind, ErrorKind::Type);
}

#[test]
fn subclass_instances_fit_base_variables() {
    let source = format!("{}DECLARE pet : Animal\npet <- NEW Dog()\nOUTPUT \"ok\"", HIERARCHY);
    assert_eq!(run_with(&source, &Config::default()).unwrap(), vec!["ok"]);

    let source = format!("{}DECLARE dog : Dog\ndog <- NEW Animal()", HIERARCHY);
    assert_eq!(run_with(&source, &Config::default()).unwrap_err().kind, ErrorKind::Type);
}

#[test]
fn integer_ranges_are_bounds_checked() {
    let source = "DECLARE d : 1..6\nd <- 4\nOUTPUT d\nd <- 7";
    let mut io = CapturedIo::new();
    let mut fs = MemoryFileSystem::new();
    let result = run_source(source, &Config::default(), &mut io, &mut fs);
    assert_eq!(io.lines, vec!["4"]);
    assert!(result.is_err());
}

#[test]
fn unknown_type_is_reported() {
    let err = run_with("DECLARE x : Widget", &Config::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err.message.contains("Widget"));
}
