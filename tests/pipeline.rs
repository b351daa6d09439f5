use pseudo::ast::{ProgramNode, StatementType};
use pseudo::diagnostics::DiagnosticPrinter;
use pseudo::lexer::{lex, TokenKind};
use pseudo::{parse, Config, ErrorKind, PResult};

fn parse_source(source: &str) -> PResult<pseudo::ast::Program> {
    let config = Config::default();
    parse(&lex(source, &config)?, &config)
}

#[test]
fn keywords_and_operators() {
    let tokens = lex("DECLARE total : INTEGER\ntotal <- total + 1", &Config::default()).unwrap();
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(kinds[0], TokenKind::Declare);
    assert_eq!(kinds[1], TokenKind::Name);
    assert!(kinds.contains(&TokenKind::Newline));
    assert!(kinds.contains(&TokenKind::Assignment));
}

#[test]
fn unterminated_string_is_a_lex_error() {
    let err = lex("OUTPUT \"oops", &Config::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lex);
    assert_eq!(err.code, "E_LEX");
}

#[test]
fn top_level_statements_in_order() {
    let program = parse_source(
        "DECLARE x : INTEGER\nx <- 1\nWHILE x < 3\n  x <- x + 1\nENDWHILE\nOUTPUT x",
    )
    .unwrap();
    let types: Vec<StatementType> = program.nodes.iter().map(|n| n.head().statement_type).collect();
    assert_eq!(
        types,
        vec![
            StatementType::Declare,
            StatementType::Assignment,
            StatementType::While,
            StatementType::Output,
        ]
    );
    let ProgramNode::Block(block) = &program.nodes[2] else {
        panic!("expected a block");
    };
    assert_eq!(block.groups[0].len(), 1);
}

#[test]
fn case_branches_split_onto_their_own_lines() {
    let program = parse_source("CASE OF x\n  1 : OUTPUT \"a\"\n  OTHERWISE OUTPUT \"b\"\nENDCASE").unwrap();
    let ProgramNode::Block(block) = &program.nodes[0] else {
        panic!("expected a block");
    };
    let controls: Vec<StatementType> = block.controls.iter().map(|c| c.statement_type).collect();
    assert_eq!(
        controls,
        vec![
            StatementType::Case,
            StatementType::CaseBranch,
            StatementType::Otherwise,
            StatementType::EndCase,
        ]
    );
}

#[test]
fn unclosed_block_is_a_parse_error() {
    let err = parse_source("IF TRUE THEN\n  OUTPUT 1").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
}

#[test]
fn semicolons_need_config() {
    assert!(parse_source("OUTPUT 1; OUTPUT 2").is_err());

    let mut config = Config::default();
    config.syntax.semicolons_as_newlines = true;
    let program = parse(&lex("OUTPUT 1; OUTPUT 2", &config).unwrap(), &config).unwrap();
    assert_eq!(program.nodes.len(), 2);
}

#[test]
fn diagnostics_point_at_the_source() {
    let source = "DECLARE x : INTEGER\nx <- \"text";
    let err = lex(source, &Config::default()).unwrap_err();
    let rendered = DiagnosticPrinter::new("main.pseudo", source).render(&err);
    assert!(rendered.contains("E_LEX"));
    assert!(rendered.contains("main.pseudo"));
}
