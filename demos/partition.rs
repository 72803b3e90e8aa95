use std::collections::BTreeSet;
use std::env;

use anyhow::bail;
use anyhow::Context as _;
use anyhow::Result;

use symspace::partition::partition;
use symspace::Address;


fn parse_address(s: &str) -> Result<Address> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let addr = u64::from_str_radix(digits, 16)
        .with_context(|| format!("failed to parse address: {s}"))?;
    Ok(Address::new(addr))
}

fn main() -> Result<()> {
    let args = env::args().collect::<Vec<_>>();

    if args.len() < 2 {
        bail!(
            "Usage: {} <address>...
Partition the given set of hexadecimal addresses into address
bitmaps and print them.",
            args.first().map(String::as_str).unwrap_or("partition")
        );
    }

    let addrs = args[1..]
        .iter()
        .map(String::as_str)
        .map(parse_address)
        .collect::<Result<BTreeSet<_>>>()?;

    for bitmap in partition(&addrs) {
        println!("{bitmap}");
    }
    Ok(())
}
