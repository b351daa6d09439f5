use pseudo::{run_source, CapturedIo, Config, MemoryFileSystem, PseudoError};

fn run_in(fs: &mut MemoryFileSystem, source: &str) -> Result<Vec<String>, PseudoError> {
    let mut io = CapturedIo::new();
    run_source(source, &Config::default(), &mut io, fs)?;
    Ok(io.lines)
}

#[test]
fn write_then_read_back() {
    let mut fs = MemoryFileSystem::new();
    let source = "\
OPENFILE \"out.txt\" FOR WRITE
WRITEFILE \"out.txt\", \"first\"
WRITEFILE \"out.txt\", 2
CLOSEFILE \"out.txt\"";
    run_in(&mut fs, source).unwrap();
    assert_eq!(fs.contents("out.txt"), Some("first\n2\n"));

    let source = "\
DECLARE line : STRING
OPENFILE \"out.txt\" FOR READ
WHILE NOT EOF(\"out.txt\")
  READFILE \"out.txt\", line
  OUTPUT \"> \", line
ENDWHILE
CLOSEFILE \"out.txt\"";
    assert_eq!(run_in(&mut fs, source).unwrap(), vec!["> first", "> 2"]);
}

#[test]
fn write_truncates_and_append_extends() {
    let mut fs = MemoryFileSystem::new().with_file("log.txt", "old\n");
    run_in(&mut fs, "OPENFILE \"log.txt\" FOR APPEND\nWRITEFILE \"log.txt\", \"new\"\nCLOSEFILE \"log.txt\"").unwrap();
    assert_eq!(fs.contents("log.txt"), Some("old\nnew\n"));

    run_in(&mut fs, "OPENFILE \"log.txt\" FOR WRITE\nWRITEFILE \"log.txt\", \"only\"\nCLOSEFILE \"log.txt\"").unwrap();
    assert_eq!(fs.contents("log.txt"), Some("only\n"));
}

#[test]
fn read_parses_by_target_type() {
    let mut fs = MemoryFileSystem::new().with_file("nums.txt", "4\n5\n");
    let source = "\
DECLARE a : INTEGER
DECLARE b : INTEGER
OPENFILE \"nums.txt\" FOR READ
READFILE \"nums.txt\", a
READFILE \"nums.txt\", b
CLOSEFILE \"nums.txt\"
OUTPUT a * b";
    assert_eq!(run_in(&mut fs, source).unwrap(), vec!["20"]);
}

#[test]
fn reading_past_the_end_fails() {
    let mut fs = MemoryFileSystem::new().with_file("one.txt", "x\n");
    let source = "\
DECLARE s : STRING
OPENFILE \"one.txt\" FOR READ
READFILE \"one.txt\", s
READFILE \"one.txt\", s";
    let err = run_in(&mut fs, source).unwrap_err();
    assert!(err.message.contains("No more lines"));
}

#[test]
fn reading_a_missing_file_fails() {
    let mut fs = MemoryFileSystem::new();
    let err = run_in(&mut fs, "OPENFILE \"missing.txt\" FOR READ").unwrap_err();
    assert!(err.message.contains("does not exist"));
}

#[test]
fn opening_twice_fails() {
    let mut fs = MemoryFileSystem::new().with_file("a.txt", "");
    let err = run_in(&mut fs, "OPENFILE \"a.txt\" FOR READ\nOPENFILE \"a.txt\" FOR READ").unwrap_err();
    assert!(err.message.contains("already opened"));
}

#[test]
fn writing_to_a_read_file_fails() {
    let mut fs = MemoryFileSystem::new().with_file("a.txt", "");
    assert!(run_in(&mut fs, "OPENFILE \"a.txt\" FOR READ\nWRITEFILE \"a.txt\", 1").is_err());
}

#[test]
fn closing_an_unopened_file_fails() {
    let mut fs = MemoryFileSystem::new();
    let err = run_in(&mut fs, "CLOSEFILE \"nothing.txt\"").unwrap_err();
    assert!(err.message.contains("not open"));
}

#[test]
fn unclosed_files_are_not_saved() {
    let mut fs = MemoryFileSystem::new();
    run_in(&mut fs, "OPENFILE \"draft.txt\" FOR WRITE\nWRITEFILE \"draft.txt\", \"lost\"").unwrap();
    assert_eq!(fs.contents("draft.txt"), Some(""));
}

#[test]
fn random_access_records() {
    let mut fs = MemoryFileSystem::new();
    let source = "\
DECLARE n : INTEGER
OPENFILE \"data.dat\" FOR RANDOM
SEEK \"data.dat\", 2
PUTRECORD \"data.dat\", 99
GETRECORD \"data.dat\", n
CLOSEFILE \"data.dat\"
OUTPUT n";
    assert_eq!(run_in(&mut fs, source).unwrap(), vec!["99"]);
    assert_eq!(fs.contents("data.dat"), Some("null\n99\n"));
}

#[test]
fn random_access_with_records() {
    let mut fs = MemoryFileSystem::new();
    let source = "\
TYPE Student
  DECLARE name : STRING
  DECLARE age : INTEGER
ENDTYPE
DECLARE s : Student
DECLARE t : Student
s.name <- \"Ada\"
s.age <- 17
OPENFILE \"students.dat\" FOR RANDOM
SEEK \"students.dat\", 1
PUTRECORD \"students.dat\", s
GETRECORD \"students.dat\", t
CLOSEFILE \"students.dat\"
OUTPUT t.name, \" \", t.age";
    assert_eq!(run_in(&mut fs, source).unwrap(), vec!["Ada 17"]);
}

#[test]
fn empty_record_fails() {
    let mut fs = MemoryFileSystem::new();
    let source = "\
DECLARE n : INTEGER
OPENFILE \"data.dat\" FOR RANDOM
SEEK \"data.dat\", 3
GETRECORD \"data.dat\", n";
    let err = run_in(&mut fs, source).unwrap_err();
    assert!(err.message.contains("empty"));
}

#[test]
fn seek_before_first_record_fails() {
    let mut fs = MemoryFileSystem::new();
    let err = run_in(&mut fs, "OPENFILE \"d.dat\" FOR RANDOM\nSEEK \"d.dat\", 0").unwrap_err();
    assert!(err.message.contains("start at 1"));
}

#[test]
fn seek_past_the_record_limit_fails() {
    let mut fs = MemoryFileSystem::new();
    let source = "\
OPENFILE \"r.dat\" FOR RANDOM
SEEK \"r.dat\", 9223372036854775807
PUTRECORD \"r.dat\", 1";
    let err = run_in(&mut fs, source).unwrap_err();
    assert!(err.message.contains("past the last allowed record"));
    assert!(err.help.is_some());
}

#[test]
fn record_limit_follows_config() {
    let mut config = Config::default();
    config.runtime.max_file_records = 3;
    let mut io = CapturedIo::new();
    let mut fs = MemoryFileSystem::new();
    let source = "\
OPENFILE \"r.dat\" FOR RANDOM
SEEK \"r.dat\", 3
PUTRECORD \"r.dat\", 7
SEEK \"r.dat\", 4";
    let err = run_source(source, &config, &mut io, &mut fs).unwrap_err();
    assert!(err.message.contains("past the last allowed record (3)"));
}
