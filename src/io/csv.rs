/*!
# Saving chains to CSV

Writes one row per stored value with the columns `chain`, `iteration` and `value`. Enable
via the `csv` feature.
*/

use csv::Writer;
use num_traits::Float;
use std::fmt::Display;
use std::io::Write;
use std::path::Path;

use crate::chain::Chain;

/**
Saves one or more chains as a CSV file.

# Examples

```rust
use mini_metropolis::distributions::NormalLikelihood;
use mini_metropolis::io::csv::save_csv;
use mini_metropolis::metropolis::{Metropolis, SamplerConfig};

let sampler = Metropolis::builder(SamplerConfig::new(150.0_f64, 100, 2.0).set_seed(42))
    .likelihood(NormalLikelihood::new(144.0, 15.0))
    .build()
    .unwrap();
let chains = sampler.run_chains(2).unwrap();

save_csv(&chains, "/tmp/chains.csv").expect("Expecting saving chains to succeed");
```
*/
pub fn save_csv<T, P>(chains: &[Chain<T>], path: P) -> Result<(), csv::Error>
where
    T: Float + Display,
    P: AsRef<Path>,
{
    write_csv(chains, std::fs::File::create(path)?)
}

/// Writes the same layout as [`save_csv`] to any writer.
pub fn write_csv<T, W>(chains: &[Chain<T>], writer: W) -> Result<(), csv::Error>
where
    T: Float + Display,
    W: Write,
{
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(["chain", "iteration", "value"])?;
    for (chain_idx, chain) in chains.iter().enumerate() {
        for (iteration, value) in chain.iter().enumerate() {
            wtr.write_record(&[chain_idx.to_string(), iteration.to_string(), value.to_string()])?;
        }
    }
    wtr.flush()?;
    Ok(())
}
