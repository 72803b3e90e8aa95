use std::io::Write as _;
use std::path::Path;

use symspace::message::FileNameMsg;
use symspace::message::LoadedLinkedObjectMsg;
use symspace::message::ThreadNameMsg;
use symspace::message::UnloadedLinkedObjectMsg;
use symspace::resolve;
use symspace::Address;
use symspace::AddressRange;
use symspace::AddressSpace;
use symspace::DebugInfo;
use symspace::ErrorKind;
use symspace::FileName;
use symspace::FunctionInfo;
use symspace::LinkedObject;
use symspace::Result;
use symspace::StatementInfo;
use symspace::Time;
use symspace::TimeInterval;

use tempfile::NamedTempFile;

use test_log::test;
use test_tag::tag;


fn range(begin: u64, end: u64) -> AddressRange {
    AddressRange::from(begin..end)
}

fn libfoo() -> FileNameMsg {
    FileNameMsg {
        path: "/lib/libfoo.so".into(),
        checksum: 0,
    }
}

fn thread() -> ThreadNameMsg {
    ThreadNameMsg {
        host: "localhost".to_string(),
        pid: 1234,
        posix_tid: None,
    }
}


/// Check the life cycle of a linked object that gets loaded and later
/// unloaded again.
#[tag(miri)]
#[test]
fn load_unload_life_cycle() {
    let mut space = AddressSpace::new();
    let lo = space
        .apply_loaded(&LoadedLinkedObjectMsg {
            threads: vec![thread()],
            time: 100,
            range: range(0x1000, 0x2000).into(),
            linked_object: libfoo(),
            is_executable: false,
        })
        .unwrap();
    let () = space
        .apply_unloaded(&UnloadedLinkedObjectMsg {
            threads: vec![thread()],
            time: 200,
            range: range(0x1000, 0x2000).into(),
            linked_object: libfoo(),
        })
        .unwrap();

    let at = |addr, time| space.linked_object_at(Address::new(addr), Time::from_nanos(time));
    assert_eq!(at(0x1500, 150), Some(lo.clone()));
    assert_eq!(at(0x1500, 250), None);
    assert_eq!(at(0x1500, 99), None);
    assert_eq!(at(0x1000, 100), Some(lo.clone()));
    assert_eq!(at(0x1fff, 199), Some(lo.clone()));
    assert_eq!(at(0x1fff, 200), None);
    assert_eq!(at(0x2000, 150), None);
    assert_eq!(lo.path(), Path::new("/lib/libfoo.so"));
}

/// Check that an address space with a dynamically loaded library can
/// be serialized for a thread and restored again.
#[tag(miri)]
#[test]
fn group_message_round_trip() {
    let exe = LinkedObject::from_file_name(FileName::with_checksum("/bin/app", 0x1234));

    let mut space = AddressSpace::new();
    let () = space
        .add_executable(&exe, range(0x400000, 0x480000), TimeInterval::forever())
        .unwrap();
    let _lo = space
        .apply_loaded(&LoadedLinkedObjectMsg {
            time: 100,
            range: range(0x7f000000, 0x7f100000).into(),
            linked_object: libfoo(),
            ..Default::default()
        })
        .unwrap();

    let msg = space.to_message(thread());
    let restored = AddressSpace::try_from(&msg).unwrap();
    assert!(restored.equivalent(&space));

    let exe = restored
        .linked_object_at(Address::new(0x400100), Time::now())
        .unwrap();
    assert_eq!(exe.checksum(), 0x1234);
    let mapping = restored
        .mapping_at(Address::new(0x400100), Time::THE_BEGINNING)
        .unwrap();
    assert!(mapping.is_executable());

    let lib = restored
        .mapping_at(Address::new(0x7f000010), Time::from_nanos(100))
        .unwrap();
    assert!(!lib.is_executable());
    assert_eq!(lib.interval().end(), Time::THE_END);
}

/// Check that unloading a linked object that was never loaded fails.
#[tag(miri)]
#[test]
fn unload_unknown() {
    let mut space = AddressSpace::new();
    let err = space
        .apply_unloaded(&UnloadedLinkedObjectMsg {
            time: 200,
            range: range(0x1000, 0x2000).into(),
            linked_object: libfoo(),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(space.mappings().is_empty());
}


#[derive(Debug)]
struct Fixed;

impl DebugInfo for Fixed {
    fn functions(&self) -> Result<Vec<FunctionInfo>> {
        Ok(vec![FunctionInfo {
            name: "_Z7computei".to_string(),
            range: range(0x40, 0x80),
        }])
    }

    fn statements(&self) -> Result<Vec<StatementInfo>> {
        Ok(vec![StatementInfo {
            path: "/src/compute.cpp".into(),
            line: 17,
            column: 3,
            range: range(0x48, 0x50),
        }])
    }
}

/// Check that we can find the function executing at an absolute
/// address at a given time, after resolving the debug information of a
/// linked object backed by an actual file.
#[test]
fn resolve_and_lookup() {
    let mut file = NamedTempFile::new().unwrap();
    let () = file.write_all(b"\x7fELF").unwrap();
    let () = file.as_file().sync_all().unwrap();

    let file_name = FileName::from_path(file.path()).unwrap();
    assert_ne!(file_name.checksum(), 0);
    assert!(file_name.is_current().unwrap());

    let mut space = AddressSpace::new();
    let lo = space
        .apply_loaded(&LoadedLinkedObjectMsg {
            time: 10,
            range: range(0x10000, 0x20000).into(),
            linked_object: (&file_name).into(),
            ..Default::default()
        })
        .unwrap();
    let () = resolve(&lo, &Fixed).unwrap();

    let addr = Address::new(0x1004a);
    let mapping = space.mapping_at(addr, Time::from_nanos(20)).unwrap();
    let relative = mapping.relative(addr).unwrap();
    assert_eq!(relative, Address::new(0x4a));

    let functions = mapping.linked_object().functions_at(relative);
    assert_eq!(functions.len(), 1);
    let function = functions.first().unwrap();
    assert_eq!(function.mangled_name(), "_Z7computei");
    #[cfg(feature = "demangle")]
    assert_eq!(function.demangled_name(), "compute(int)");

    let statements = function.statements();
    assert_eq!(statements.len(), 1);
    let statement = statements.first().unwrap();
    assert_eq!(statement.to_string(), "/src/compute.cpp:17:3");
    assert_eq!(function.definitions(), Default::default());

    let () = file.write_all(b" changed").unwrap();
    let () = file.as_file().sync_all().unwrap();
    let err = resolve(&lo, &Fixed).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}
