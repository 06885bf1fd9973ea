//! Writes a small synthetic samples directory that `gw-samples serve` can index.
//!
//! Layout produced under `<out>`:
//! - `events/demo/<tag>-GWxxxxxx_xxxxxx-demo.samples` for two events, each with two models
//! - `injections/demo/o3-demo.samples` with two IFAR columns

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use gw_samples::archive::parquet::save_archive;
use gw_samples::archive::{MemoryArchive, MemoryGroup, MemoryTable};
use gw_samples::catalog::{EVENTS_DIR, INJECTIONS_DIR};
use gw_samples::injections::{INJECTIONS_GROUP, INJECTION_TABLE, YEAR};
use gw_samples::posterior::POSTERIOR_TABLE;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal, Normal, Uniform};

const MODELS: [&str; 2] = ["C01:IMRPhenomXPHM", "C01:SEOBNRv4PHM"];
/// (event, mean primary mass, mean mass ratio, mean luminosity distance)
const EVENTS: [(&str, f64, f64, f64); 2] = [
    ("GW150914_095045", 35.6, 0.86, 440.0),
    ("GW151226_033853", 13.7, 0.56, 450.0),
];

/// Synthetic sample generator.
#[derive(Parser, Debug)]
#[command(name = "demo", about)]
struct Cli {
    /// Directory to create.
    out: PathBuf,

    /// Seed for all synthetic draws.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Posterior samples per model.
    #[arg(long, default_value = "5000")]
    n_samples: usize,

    /// Generated injections (found and missed).
    #[arg(long, default_value = "20000")]
    n_injections: usize,
}

fn draw<D: Distribution<f64>>(dist: D, n: usize, rng: &mut SmallRng) -> Vec<f64> {
    dist.sample_iter(rng).take(n).collect()
}

fn posterior_table(
    mass_1: f64,
    q: f64,
    distance: f64,
    n: usize,
    rng: &mut SmallRng,
) -> Result<MemoryTable, Box<dyn Error>> {
    let m1 = draw(Normal::new(mass_1, 0.08 * mass_1)?, n, rng);
    let ratio: Vec<f64> = draw(Normal::new(q, 0.1)?, n, rng)
        .into_iter()
        .map(|x| x.clamp(0.05, 1.0))
        .collect();
    let m2: Vec<f64> = m1.iter().zip(&ratio).map(|(a, b)| a * b).collect();
    let chirp: Vec<f64> = m1
        .iter()
        .zip(&m2)
        .map(|(a, b)| (a * b).powf(0.6) / (a + b).powf(0.2))
        .collect();
    let chi_eff = draw(Normal::new(0.0, 0.1)?, n, rng);
    let d_l = draw(LogNormal::new(distance.ln(), 0.3)?, n, rng);

    Ok(MemoryTable::from_columns([
        ("mass_1_source", m1),
        ("mass_2_source", m2),
        ("mass_ratio", ratio),
        ("chirp_mass_source", chirp),
        ("chi_eff", chi_eff),
        ("luminosity_distance", d_l),
    ])?)
}

fn write_events(out: &Path, n: usize, rng: &mut SmallRng) -> Result<(), Box<dyn Error>> {
    for (event, mass_1, q, distance) in EVENTS {
        let mut archive = MemoryArchive::new(event);
        for model in MODELS {
            let table = posterior_table(mass_1, q, distance, n, rng)?;
            archive = archive.with_group(MemoryGroup::new(model).with_table(POSTERIOR_TABLE, table));
        }
        // A model group without a table: discovery lists its sub-groups.
        archive = archive.with_group(
            MemoryGroup::new("C01:Mixed")
                .with_subgroup(MemoryGroup::new("approximant"))
                .with_subgroup(MemoryGroup::new("meta_data")),
        );

        let path = out
            .join(EVENTS_DIR)
            .join("demo")
            .join(format!("IGWN-GWTC-{event}-demo.samples"));
        save_archive(&archive, &path)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn write_injections(out: &Path, n: usize, rng: &mut SmallRng) -> Result<(), Box<dyn Error>> {
    let mass_1 = draw(Uniform::new(5.0, 80.0), n, rng);
    let redshift = draw(Uniform::new(0.01, 1.5), n, rng);
    let sampling_pdf: Vec<f64> = mass_1.iter().map(|_| 1.0 / (75.0 * 1.49)).collect();
    // Closer, heavier sources are more likely to be found.
    let ifar = |rng: &mut SmallRng| -> Vec<f64> {
        mass_1
            .iter()
            .zip(&redshift)
            .map(|(m, z)| {
                let loudness = m / 80.0 / z;
                if rng.gen::<f64>() < loudness.min(1.0) {
                    rng.gen_range(1.0..1.0e5)
                } else {
                    rng.gen_range(0.0..1.0)
                }
            })
            .collect()
    };
    let ifar_pycbc = ifar(&mut *rng);
    let ifar_gstlal = ifar(&mut *rng);

    let table = MemoryTable::from_columns([
        ("mass1_source", mass_1),
        ("redshift", redshift),
        ("sampling_pdf", sampling_pdf),
        ("ifar_pycbc", ifar_pycbc),
        ("ifar_gstlal", ifar_gstlal),
    ])?;
    let archive = MemoryArchive::new("o3-demo").with_group(
        MemoryGroup::new(INJECTIONS_GROUP)
            .with_attribute("analysis_time_s", 0.9 * YEAR)
            .with_attribute("total_generated", 2.0 * n as f64)
            .with_table(INJECTION_TABLE, table),
    );

    let path = out
        .join(INJECTIONS_DIR)
        .join("demo")
        .join("o3-demo.samples");
    save_archive(&archive, &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut rng = SmallRng::seed_from_u64(cli.seed);
    write_events(&cli.out, cli.n_samples, &mut rng)?;
    write_injections(&cli.out, cli.n_injections, &mut rng)?;
    println!(
        "Serve with: gw-samples serve --samples-dir {}",
        cli.out.display()
    );
    Ok(())
}

/// Main entry point: draws synthetic posteriors and injections and writes them
/// in the archive layout.
fn main() -> Result<(), Box<dyn Error>> {
    run(&Cli::parse())
}

#[test]
fn test_demo_directory_is_indexable() {
    let dir = tempfile::TempDir::new().expect("Could not create temp dir");
    let cli = Cli {
        out: dir.path().to_path_buf(),
        seed: 1,
        n_samples: 50,
        n_injections: 200,
    };
    run(&cli).expect("Expected the demo run to succeed.");

    let catalog = gw_samples::catalog::Catalog::scan(dir.path()).unwrap();
    assert_eq!(catalog.events(), vec!["GW150914_095045", "GW151226_033853"]);
    assert_eq!(catalog.injection_sets(), vec!["o3"]);
}
