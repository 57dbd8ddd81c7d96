#[macro_use]
mod cases;

use indoc::indoc;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use tale::{ExecutionOptions, FailureKind, FileAccess};

fn memory(files: &[(&str, &str)]) -> ExecutionOptions {
    ExecutionOptions {
        file_access: FileAccess::Memory {
            files: files
                .iter()
                .map(|(path, text)| (path.to_string(), text.to_string()))
                .collect(),
        },
        ..ExecutionOptions::default()
    }
}

test_case!(
    write_then_read,
    input: indoc! {r#"
        open "log.txt" as f for writing
        write f "first"
        close f
        open "log.txt" as f for appending
        write f " second"
        close f
        open "log.txt" as f
        say read f
    "#},
    output: Ok("first second\n"),
);

test_case!(
    csv_round_trip,
    input: indoc! {r#"
        csv write [["name", "age"], ["Ada", "36"]] to "people.csv"
        rows is csv read "people.csv"
        for each row in rows
          say row[0], row[1]
        end
    "#},
    output: Ok("name age\nAda 36\n"),
);

test_case!(
    reading_a_missing_file,
    input: indoc! {r#"
        say "start"
        open "missing.txt" as f
    "#},
    output: Err((FailureKind::Runtime, "start\n")),
);

test_case!(
    writing_to_a_read_handle,
    input: indoc! {r#"
        open "a.txt" as f for writing
        close f
        open "a.txt" as f
        write f "nope"
    "#},
    output: Err((FailureKind::Runtime, "")),
);

#[test]
fn test_memory_files_are_returned() {
    let source = indoc! {r#"
        ask name
        open "greeting.txt" as f for writing
        write f "Hello, " + name
        close f
        json write {"name": name} to "data.json"
    "#};
    let outcome = cases::ENGINE.run_with(source, &cases::inputs(&["Ada"]), &ExecutionOptions::default(), None);
    assert!(outcome.ok, "{:?}", outcome.error);
    let files = outcome.files.unwrap();
    assert_eq!(files.get("greeting.txt").map(String::as_str), Some("Hello, Ada"));
    assert!(files.contains_key("data.json"));
}

#[test]
fn test_seeded_files_are_readable() {
    let source = indoc! {r#"
        open "scores.txt" as f
        total is 0
        for each line in f
          add number(line) to total
        end
        say total
    "#};
    let outcome = cases::ENGINE.run_with(source, &[], &memory(&[("scores.txt", "10\n20\n12\n")]), None);
    assert!(outcome.ok, "{:?}", outcome.error);
    assert_eq!(outcome.output, "42\n");
    let files = outcome.files.unwrap();
    assert_eq!(files, BTreeMap::from([("scores.txt".to_string(), "10\n20\n12\n".to_string())]));
}

#[test]
fn test_runs_do_not_share_files() {
    let options = memory(&[]);
    let writer = cases::ENGINE.run_with("json write [1] to \"shared.json\"", &[], &options, None);
    assert!(writer.ok);
    let reader = cases::ENGINE.run_with("say json read \"shared.json\"", &[], &options, None);
    assert_eq!(reader.error.unwrap().kind, FailureKind::Runtime);
}

#[test]
fn test_directory_backend() {
    let root = std::env::temp_dir().join(format!("tale-files-{}", std::process::id()));
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("in.txt"), "from disk").unwrap();

    let options = ExecutionOptions {
        file_access: FileAccess::Directory { root: root.clone() },
        ..ExecutionOptions::default()
    };
    let source = indoc! {r#"
        open "in.txt" as f
        content is read f
        close f
        open "out.txt" as g for writing
        write g upper of content
        close g
    "#};
    let outcome = cases::ENGINE.run_with(source, &[], &options, None);
    assert!(outcome.ok, "{:?}", outcome.error);
    assert_eq!(outcome.files, None);
    assert_eq!(std::fs::read_to_string(root.join("out.txt")).unwrap(), "FROM DISK");

    let escape = cases::ENGINE.run_with("open \"../in.txt\" as f", &[], &options, None);
    assert_eq!(escape.error.unwrap().kind, FailureKind::Runtime);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn test_appending_past_the_size_limit() {
    let options = ExecutionOptions {
        max_collection_len: 1_000,
        ..memory(&[])
    };
    let source = indoc! {r#"
        chunk is "x" * 400
        open "big.txt" as f for appending
        repeat 10 times
          write f chunk
        end
    "#};
    let outcome = cases::ENGINE.run_with(source, &[], &options, None);
    let error = outcome.error.unwrap();
    assert_eq!(error.kind, FailureKind::ResourceExceeded);
    assert_eq!(error.line, Some(4));
}
