use std::collections::BTreeSet;
use std::path::Path;

use rand::Rng as _;

use symspace::Address;
use symspace::AddressRange;
use symspace::FileName;
use symspace::Function;
use symspace::LinkedObject;
use symspace::Statement;
use symspace::SymbolTable;

use test_log::test;
use test_tag::tag;


fn range(begin: u64, end: u64) -> AddressRange {
    AddressRange::from(begin..end)
}

fn linked_object(path: &str) -> LinkedObject {
    LinkedObject::from_file_name(FileName::with_checksum(path, 0))
}

fn random_ranges(count: usize) -> Vec<AddressRange> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| {
            let begin = rng.random_range(0..0x4000);
            let width = rng.random_range(1..0x40);
            range(begin, begin + width)
        })
        .collect()
}

fn union(ranges: &[AddressRange]) -> BTreeSet<u64> {
    ranges
        .iter()
        .flat_map(|range| range.begin().get()..range.end().get())
        .collect()
}

fn flatten(ranges: &BTreeSet<AddressRange>) -> BTreeSet<u64> {
    ranges
        .iter()
        .flat_map(|range| range.begin().get()..range.end().get())
        .collect()
}


/// Check that adding address ranges piecemeal is equivalent to adding
/// them all at once.
#[tag(miri)]
#[test]
fn incremental_accumulation() {
    let r1 = random_ranges(16);
    let r2 = random_ranges(16);

    let mut table = SymbolTable::new(FileName::with_checksum("/bin/app", 0));
    let incremental = table.add_function("incremental");
    let () = table.add_function_address_ranges(incremental, r1.iter().copied());
    let () = table.add_function_address_ranges(incremental, r2.iter().copied());

    let at_once = table.add_function("at_once");
    let () = table.add_function_address_ranges(at_once, r1.iter().chain(&r2).copied());

    assert_eq!(
        table.function_address_ranges(incremental),
        table.function_address_ranges(at_once)
    );

    let all = r1.iter().chain(&r2).copied().collect::<Vec<_>>();
    assert_eq!(
        flatten(&table.function_address_ranges(incremental)),
        union(&all)
    );
}

/// Check that every address of an entry finds that entry exactly once,
/// and that no other address finds it.
#[test]
fn index_consistency() {
    let lo = linked_object("/bin/app");
    let function = Function::new(&lo, "foo");
    let statement = Statement::new(&lo, "/src/foo.c", 1, 1);

    let mut expected = BTreeSet::new();
    for _ in 0..4 {
        let ranges = random_ranges(4);
        let () = function.add_address_ranges(ranges.iter().copied());
        let () = statement.add_address_ranges(ranges.iter().copied());
        let () = expected.extend(union(&ranges));

        for addr in 0..0x4100 {
            let functions = lo.functions_at(Address::new(addr));
            let statements = lo.statements_at(Address::new(addr));
            if expected.contains(&addr) {
                assert_eq!(functions, BTreeSet::from([function.clone()]), "{addr:#x}");
                assert_eq!(statements, BTreeSet::from([statement.clone()]), "{addr:#x}");
            } else {
                assert!(functions.is_empty(), "{addr:#x}");
                assert!(statements.is_empty(), "{addr:#x}");
            }
        }
    }
}

/// Check that function handles of the same table and identifier compare
/// equal, while those of different tables do not.
#[tag(miri)]
#[test]
fn handle_equality() {
    let lo = linked_object("/lib/libfoo.so");
    let other = linked_object("/lib/libfoo.so");

    let f = Function::new(&lo, "foo");
    let g = Function::new(&other, "foo");
    assert_eq!(f.uid(), g.uid());
    assert_ne!(f, g);

    let found = lo.functions_by_name("foo");
    assert_eq!(found, BTreeSet::from([f.clone()]));

    let copy = lo.clone();
    assert_eq!(copy.functions(), BTreeSet::from([f]));
}

/// Check that names that are not mangled are reported unchanged.
#[tag(miri)]
#[test]
fn demangle_fallback() {
    let lo = linked_object("/lib/libfoo.so");
    let function = Function::new(&lo, "not_a_mangled_name");
    assert_eq!(function.demangled_name(), "not_a_mangled_name");
    assert_eq!(function.to_string(), "not_a_mangled_name");
    assert_eq!(symspace::demangle("not_a_mangled_name"), "not_a_mangled_name");
}

/// Check that a cloned function starts with its source's addresses but
/// evolves independently.
#[tag(miri)]
#[test]
fn clone_isolation() {
    let source = linked_object("/lib/libfoo.so");
    let target = linked_object("/lib/libbar.so");

    let function = Function::new(&source, "foo");
    let () = function.add_address_ranges([range(0x100, 0x180)]);
    let clone = function.clone_to(&target);
    assert_eq!(clone.address_ranges(), function.address_ranges());

    let () = clone.add_address_ranges([range(0x400, 0x408)]);
    let () = function.add_address_ranges([range(0x800, 0x808)]);
    assert_eq!(
        clone.address_ranges(),
        BTreeSet::from([range(0x100, 0x180), range(0x400, 0x408)])
    );
    assert_eq!(
        function.address_ranges(),
        BTreeSet::from([range(0x100, 0x180), range(0x800, 0x808)])
    );
}

/// Check that a populated symbol table survives conversion into a
/// message and back.
#[test]
fn message_round_trip() {
    let lo = linked_object("/lib/libfoo.so");
    for i in 0..32u32 {
        let function = Function::new(&lo, format!("function{i}"));
        let () = function.add_address_ranges(random_ranges(4));
        let statement = Statement::new(&lo, "/src/foo.c", i, 0);
        let () = statement.add_address_ranges(random_ranges(2));
    }

    let msg = lo.to_message();
    let decoded = LinkedObject::try_from(&msg).unwrap();
    assert_eq!(decoded.file_name(), lo.file_name());

    let functions = lo.functions();
    let decoded_functions = decoded.functions();
    assert_eq!(functions.len(), decoded_functions.len());
    for (f, g) in functions.iter().zip(&decoded_functions) {
        assert_eq!(f.uid(), g.uid());
        assert!(f.equivalent(g));
    }

    assert_eq!(
        decoded
            .statements_by_source_file(Path::new("/src/foo.c"))
            .len(),
        32
    );
    for (s, t) in lo.statements().iter().zip(&decoded.statements()) {
        assert!(s.equivalent(t));
    }
}
