use affinidi_jsonld::{Dataset, normalize, nquads};

fn canonical(input: &str) -> String {
    let dataset = nquads::parse(input).unwrap();
    normalize::canonicalize(&dataset).unwrap()
}

/// Test: without blank nodes canonicalization only sorts and removes duplicates.
#[test]
fn ground_dataset_is_sorted() {
    let input = "\
<http://example.org/s2> <http://example.org/p> \"two\" .
<http://example.org/s1> <http://example.org/p> \"one\" <http://example.org/g> .
<http://example.org/s2> <http://example.org/p> \"two\" .
<http://example.org/s1> <http://example.org/p> \"one\" .
";
    assert_eq!(
        canonical(input),
        "<http://example.org/s1> <http://example.org/p> \"one\" .\n\
         <http://example.org/s1> <http://example.org/p> \"one\" <http://example.org/g> .\n\
         <http://example.org/s2> <http://example.org/p> \"two\" .\n"
    );
}

/// Test: a lone blank node becomes _:c14n0 wherever it appears.
#[test]
fn single_blank_node() {
    let input = "\
_:node <http://example.org/p> \"v\" .
<http://example.org/s> <http://example.org/q> _:node .
";
    assert_eq!(
        canonical(input),
        "<http://example.org/s> <http://example.org/q> _:c14n0 .\n\
         _:c14n0 <http://example.org/p> \"v\" .\n"
    );
}

/// Test: relabelling blank nodes or reordering lines never changes the output.
#[test]
fn labels_and_order_do_not_matter() {
    let first = "\
_:a <http://example.org/name> \"Alice\" .
_:b <http://example.org/name> \"Bob\" .
_:a <http://example.org/knows> _:b .
_:c <http://example.org/knows> _:a .
_:c <http://example.org/knows> _:b .
";
    let second = "\
_:x3 <http://example.org/knows> _:x1 .
_:x1 <http://example.org/name> \"Bob\" .
_:x3 <http://example.org/knows> _:x2 .
_:x2 <http://example.org/knows> _:x1 .
_:x2 <http://example.org/name> \"Alice\" .
";
    let result = canonical(first);
    assert_eq!(result, canonical(second));
    for label in ["_:c14n0", "_:c14n1", "_:c14n2"] {
        assert!(result.contains(label), "missing {label}");
    }
    assert!(!result.contains("_:c14n3"));
}

/// Test: blank nodes that only differ by their neighbours are told apart.
#[test]
fn identical_first_degree_hashes() {
    let first = "\
_:p <http://example.org/value> \"same\" .
_:q <http://example.org/value> \"same\" .
<http://example.org/root> <http://example.org/first> _:p .
<http://example.org/root> <http://example.org/second> _:q .
";
    let second = "\
<http://example.org/root> <http://example.org/second> _:one .
_:one <http://example.org/value> \"same\" .
<http://example.org/root> <http://example.org/first> _:two .
_:two <http://example.org/value> \"same\" .
";
    let result = canonical(first);
    assert_eq!(result, canonical(second));
    assert_eq!(result.lines().count(), 4);
}

/// Test: symmetric cycles canonicalize the same way whatever the labels.
#[test]
fn symmetric_cycle() {
    let ring = |labels: [&str; 3]| {
        format!(
            "_:{0} <http://example.org/next> _:{1} .\n\
             _:{1} <http://example.org/next> _:{2} .\n\
             _:{2} <http://example.org/next> _:{0} .\n",
            labels[0], labels[1], labels[2]
        )
    };
    let result = canonical(&ring(["a", "b", "c"]));
    assert_eq!(result, canonical(&ring(["z", "m", "a"])));
    assert_eq!(result.lines().count(), 3);
}

/// Test: blank graph names are canonicalized too.
#[test]
fn blank_graph_name() {
    let input = "<http://example.org/s> <http://example.org/p> _:o _:graph .\n";
    let result = canonical(input);
    assert!(
        result == "<http://example.org/s> <http://example.org/p> _:c14n0 _:c14n1 .\n"
            || result == "<http://example.org/s> <http://example.org/p> _:c14n1 _:c14n0 .\n",
        "unexpected output {result}"
    );
}

/// Test: canonical N-Quads parse back to the same canonical form.
#[test]
fn canonical_output_is_stable() {
    let input = "\
_:a <http://example.org/p> \"caf\\u00E9\"@fr .
_:a <http://example.org/q> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> .
";
    let once = canonical(input);
    assert!(once.contains("\"café\"@fr"));
    assert_eq!(once, canonical(&once));
}

/// Test: the empty dataset has an empty canonical form.
#[test]
fn empty_dataset() {
    assert_eq!(normalize::canonicalize(&Dataset::new()).unwrap(), "");
}
