use std::collections::BTreeSet;

use rand::Rng as _;

use symspace::partition::extract;
use symspace::partition::partition;
use symspace::partition::partition_ranges;
use symspace::partition::PARTITIONING_CRITERION;
use symspace::Address;
use symspace::AddressBitmap;
use symspace::AddressRange;

use test_log::test;
use test_tag::tag;


fn addresses(ranges: &BTreeSet<AddressRange>) -> BTreeSet<Address> {
    ranges
        .iter()
        .flat_map(|range| (range.begin().get()..range.end().get()).map(Address::new))
        .collect()
}

fn random_addresses(count: usize, spread: u64) -> BTreeSet<Address> {
    let mut rng = rand::rng();
    let base = rng.random_range(0..u64::MAX / 2);
    (0..count)
        .map(|_| Address::new(base + rng.random_range(0..spread)))
        .collect()
}

fn check_partitioning(addrs: &BTreeSet<Address>, bitmaps: &[AddressBitmap]) {
    // Extracting the partitioned set yields the original one.
    assert_eq!(&addresses(&extract(bitmaps)), addrs);

    // Bitmaps never overlap and count every address exactly once.
    for (i, a) in bitmaps.iter().enumerate() {
        for b in &bitmaps[i + 1..] {
            assert!(
                !a.range().intersects(&b.range()),
                "{} overlaps {}",
                a.range(),
                b.range()
            );
        }
    }
    let total = bitmaps
        .iter()
        .map(AddressBitmap::count_ones)
        .sum::<u64>();
    assert_eq!(total, addrs.len() as u64);

    for addr in addrs {
        let containing = bitmaps
            .iter()
            .filter(|bitmap| bitmap.range().contains(*addr))
            .collect::<Vec<_>>();
        assert_eq!(containing.len(), 1, "{addr}");
        assert!(containing[0].get(*addr), "{addr}");
    }
}


/// Check that partitioning random sparse address sets is lossless and
/// produces disjoint bitmaps.
#[tag(miri)]
#[test]
fn partition_random_sets() {
    for (count, spread) in [(1, 1), (10, 64), (100, 4096), (200, 1 << 20)] {
        let addrs = random_addresses(count, spread);
        let bitmaps = partition(&addrs);
        let () = check_partitioning(&addrs, &bitmaps);
    }
}

/// Check that addresses within the partitioning criterion of each other
/// end up in the same bitmap, while those farther apart do not.
#[tag(miri)]
#[test]
fn partition_clusters() {
    let clusters = [0x10_000u64, 0x20_000, 0x30_000];
    let addrs = clusters
        .iter()
        .flat_map(|base| [*base, base + 7, base + PARTITIONING_CRITERION])
        .map(Address::new)
        .collect::<BTreeSet<_>>();

    let bitmaps = partition(&addrs);
    let () = check_partitioning(&addrs, &bitmaps);
    assert_eq!(bitmaps.len(), clusters.len());

    let ranges = bitmaps
        .iter()
        .map(AddressBitmap::range)
        .collect::<Vec<_>>();
    assert_eq!(
        ranges,
        clusters
            .iter()
            .map(|base| AddressRange::from(*base..base + PARTITIONING_CRITERION + 1))
            .collect::<Vec<_>>()
    );
}

/// Check that partitioning ranges accepts overlapping and adjacent
/// input.
#[tag(miri)]
#[test]
fn partition_overlapping_ranges() {
    let ranges = [
        AddressRange::from(0x100..0x180),
        AddressRange::from(0x140..0x200),
        AddressRange::from(0x200..0x210),
        AddressRange::from(0x5000..0x5004),
    ];
    let bitmaps = partition_ranges(ranges);
    assert_eq!(
        extract(&bitmaps),
        BTreeSet::from([
            AddressRange::from(0x100..0x210),
            AddressRange::from(0x5000..0x5004),
        ])
    );
}
