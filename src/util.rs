use std::fs::File;
use std::io::Read;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};


/// The classic MiniSat multiplicative congruential generator. State must
/// stay inside (0, 2147483647).
pub struct Random {
    state: f64,
}

impl Random {
    /// Seed 0 means unseeded: the state is taken from the clock, so only
    /// nonzero seeds give reproducible runs.
    pub fn new(seed: u64) -> Random {
        let seed = if seed == 0 {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.subsec_nanos() as u64 | 1)
                .unwrap_or(91648253)
        } else {
            seed
        };
        Random {
            state: ((seed % 2147483646) + 1) as f64,
        }
    }

    // Returns a random float 0 <= x < 1.
    pub fn drand(&mut self) -> f64 {
        self.state *= 1389796.0;
        let q = (self.state / 2147483647.0) as i32;
        self.state -= (q as f64) * 2147483647.0;
        self.state / 2147483647.0
    }

    // Returns a random integer 0 <= x < size.
    pub fn irand(&mut self, size: usize) -> usize {
        (self.drand() * (size as f64)) as usize
    }
}


/// Adds the elapsed wall-clock milliseconds to the accumulator when the
/// guard drops.
pub struct ScopedMs<'a> {
    acc: &'a mut u64,
    start: f64,
}

impl<'a> ScopedMs<'a> {
    pub fn new(acc: &'a mut u64) -> ScopedMs<'a> {
        ScopedMs {
            acc,
            start: time::precise_time_s(),
        }
    }
}

impl<'a> Drop for ScopedMs<'a> {
    fn drop(&mut self) {
        let elapsed = time::precise_time_s() - self.start;
        *self.acc += (elapsed * 1000.0) as u64;
    }
}


#[cfg(not(target_os = "linux"))]
pub fn mem_used_peak() -> Option<usize> {
    None
}

#[cfg(target_os = "linux")]
pub fn mem_used_peak() -> Option<usize> {
    let mut buf = String::new();
    let mut stats = File::open(&format!("/proc/{}/status", process::id())).ok()?;
    stats.read_to_string(&mut buf).ok()?;
    let line = buf.lines().find(|line| line.starts_with("VmPeak:"))?;
    let mem_kb: String = line.chars().filter(|c| c.is_digit(10)).collect();
    mem_kb.parse().ok()
}
