use spectral_search::{Engine, Result, SearchOutcome, SpectralConfig};

fn main() -> Result<()> {
    // build engine
    let docs = [
        "spectral graph partitioning with laplacian eigenvectors",
        "graph laplacian eigenvalues bound the cut of a partition",
        "stochastic gradient descent trains deep neural networks",
        "training neural networks with adaptive gradient methods",
        "public key encryption resists chosen ciphertext attack",
    ];
    let ids: Vec<String> = (1..=docs.len()).map(|i| format!("paper{}", i)).collect();
    let mut config = SpectralConfig::default();
    config.decompose.k = 3;
    config.decompose.seed = Some(42);
    let engine = Engine::build(&docs, ids, &config)?;

    // save and reload the bundle
    let path = std::env::temp_dir().join("spectral_basic.cbor");
    engine.save(&path)?;
    let engine = Engine::load(&path)?;

    // search
    for query in ["laplacian partition", "neural gradient", "quasar"] {
        match engine.search(query, 3)? {
            SearchOutcome::NoMatch => println!("{:?}: no match", query),
            SearchOutcome::Matches(results) => {
                println!("{:?}:\n{:#?}", query, results);
                println!("query coordinates: {:?}", results.query_coordinates());
            }
        }
    }

    // concept spectrum
    let decomposition = engine.index().decomposition();
    println!("sigma: {:?}", decomposition.sigma.to_vec());
    println!("explained variance: {:?}", decomposition.explained_variance_ratio());

    std::fs::remove_file(&path)?;
    Ok(())
}
