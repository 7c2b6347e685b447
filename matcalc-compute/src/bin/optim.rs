//! Least-squares fitting by gradient descent, with the gradient derived symbolically.
//!
//! Minimizes `0.5*Tr((Y-D*X)'*(Y-D*X))` over `X` for a random dictionary `D` and targets `Y`.
//! Run with `RUST_LOG=debug` to see the canonicalizer at work.

use ariadne::Source;
use matcalc_compute::{
    numerical::{ctxt::Ctxt, gradient, objective},
    symbolic::{canonicalize, differentiate, expr::latex::derivative_latex, lower::{parse, Symbols}},
};
use matcalc_error::Error;
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};

const OBJECTIVE: &str = "0.5*Tr((Y - D*X)' * (Y - D*X))";

const ITERATIONS: usize = 500;

fn random(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-1.0..1.0))
}

fn frobenius_squared(matrix: &Array2<f64>) -> f64 {
    matrix.iter().map(|x| x * x).sum()
}

fn run() -> Result<(), Error> {
    let f = parse(OBJECTIVE, &Symbols::new())?;
    let raw = differentiate(&f, "X");
    let canonical = canonicalize(&raw);
    println!("f       = {}", f);
    println!("df      = {}", raw);
    println!("df      = {}  (canonical)", canonical);
    println!("latex   : {}", derivative_latex(&f, "X", &canonical, Default::default()));

    let mut rng = StdRng::seed_from_u64(0);
    let d = random(&mut rng, 20, 10);
    let truth = random(&mut rng, 10, 5);
    let y = d.dot(&truth);

    let mut ctxt = Ctxt::new();
    ctxt.add_var("D", d.clone());
    ctxt.add_var("Y", y);
    ctxt.add_var("X", Array2::<f64>::zeros((10, 5)));

    // the gradient is Lipschitz with constant ||D'D|| <= ||D||_F^2
    let step = 1.0 / frobenius_squared(&d);
    let mut x = Array2::<f64>::zeros((10, 5));
    for iteration in 0..=ITERATIONS {
        ctxt.add_var("X", x.clone());
        if iteration % 50 == 0 {
            let value = objective(&f, "X", &ctxt)(&x)?;
            println!("iteration {:>4}: f = {:.6e}", iteration, value);
        }
        let grad = gradient(&canonical, "X", &ctxt)?;
        log::trace!("gradient norm {:.6e}", frobenius_squared(&grad).sqrt());
        x = x - grad * step;
    }

    println!("distance to the generating X: {:.6e}", frobenius_squared(&(&x - &truth)).sqrt());
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        if let Err(io_err) = err.build_report("objective")
            .eprint(("objective", Source::from(OBJECTIVE))) {
            eprintln!("error: {}", io_err);
        }
        std::process::exit(1);
    }
}
