use std::process::exit;
use std::time::Duration;

use fault_bag::Bucket;
use fault_bag::Status;

// Some operation which occasionally fails (use your imagination...)
fn flaky(i: u32) -> Result<(), &'static str> {
    if i % 7 == 0 { Err("boom") } else { Ok(()) }
}

#[tokio::main]
async fn main() {
    let capacity = 60;
    let wait_hint = Duration::from_secs(5);
    let leak_interval = Duration::from_millis(1000);

    let bag = match Bucket::new(capacity, wait_hint, leak_interval) {
        Ok(bag) => bag,
        Err(e) => {
            eprintln!("impossible to create a new bucket: {e}");
            exit(1);
        }
    };
    bag.start().unwrap();

    // We do lots of calls to flaky() later on...
    for i in 0..10_000 {
        bag.record_with(flaky(i).is_err(), |status| {
            if let Status::Throttling { wait_hint } = status {
                // We are failing too often. Take the appropriate action:
                // back off for wait_hint, page someone, whatever fits.
                // If you don't care, call record() instead.
                eprintln!("throttling: backing off for {wait_hint:?}");
            }
        });
    }

    bag.stop().await.unwrap();
}
