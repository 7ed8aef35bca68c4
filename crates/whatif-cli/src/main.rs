mod input;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use whatif_ranging::{RangingResult, Session};
use whatif_solver::{LpProblem, Solution, Solver};

#[derive(Parser)]
#[command(name = "whatif")]
#[command(about = "What-if analysis of right-hand-side changes for linear programs", long_about = None)]
#[command(after_help = "Set the RUST_LOG environment variable (e.g. to debug) to enable logging to stderr.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem file and output the optimal solution
    Solve {
        /// The JSON problem file
        file: PathBuf,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Check whether changing the constraint limits keeps the optimal basis, and price the change
    Analyze {
        /// The JSON problem file
        file: PathBuf,
        /// Change for each constraint's right-hand side, comma separated (e.g. 50,0)
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        delta: Vec<f64>,
        /// Issue the perturbed solves on worker threads
        #[arg(long)]
        parallel: bool,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Check a problem file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    solution: &'a Solution,
    delta: &'a [f64],
    result: &'a RangingResult,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { file, format } => {
            let problem = load_or_exit(&file);
            let solution = solve_or_exit(&problem);

            if format == "json" {
                print_json(&solution);
            } else {
                print_solution(&problem, &solution);
            }
        }
        Commands::Analyze {
            file,
            delta,
            parallel,
            format,
        } => {
            let problem = load_or_exit(&file);
            let solver = Solver::new();

            let session = match Session::solve(&solver, &problem) {
                Ok(s) => s.with_parallel(parallel),
                Err(e) => {
                    eprintln!("Solve error: {}", e);
                    std::process::exit(1);
                }
            };

            let result = match session.run(&solver, &delta) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Analysis error: {}", e);
                    std::process::exit(1);
                }
            };

            if format == "json" {
                print_json(&AnalysisReport {
                    solution: session.baseline(),
                    delta: &delta,
                    result: &result,
                });
            } else {
                print_solution(&problem, session.baseline());
                println!();
                print_analysis(&problem, session.baseline(), &result);
            }
        }
        Commands::Check { file } => match input::load_problem(&file) {
            Ok(problem) => {
                println!("✓ {} is valid", file.display());
                println!("  {} variables", problem.num_variables());
                println!("  {} constraints", problem.num_constraints());
                println!(
                    "  objective: {}",
                    if problem.objective.minimize { "minimize" } else { "maximize" }
                );
            }
            Err(e) => {
                eprintln!("✗ {} has errors:", file.display());
                eprintln!("  {}", e);
                std::process::exit(1);
            }
        },
    }
}

fn load_or_exit(file: &Path) -> LpProblem {
    match input::load_problem(file) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn solve_or_exit(problem: &LpProblem) -> Solution {
    match Solver::new().solve(problem) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Solve error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_solution(problem: &LpProblem, solution: &Solution) {
    println!("Status: OPTIMAL");
    println!("Objective (Z*): {:.2}", solution.objective_value);
    println!();
    println!("Variables:");
    for (name, value) in problem.variables.iter().zip(&solution.values) {
        println!("  {:20} {:10.2}", name, value);
    }
    println!();
    println!("Shadow prices:");
    for (i, c) in problem.constraints.iter().enumerate() {
        println!(
            "  {:20} {:>2} {:10.2}  y {:10.4}  slack {:10.2}",
            c.name,
            c.op.symbol(),
            c.rhs,
            solution.shadow_prices[i],
            solution.slacks[i]
        );
        if let Some(meaning) = solution.interpret_shadow_price(i, 1e-9) {
            println!("    {}", meaning);
        }
    }

    if !solution.analysis.binding_constraints.is_empty() {
        println!();
        println!("Binding constraints:");
        for name in &solution.analysis.binding_constraints {
            println!("  - {}", name);
        }
    }
}

fn print_analysis(problem: &LpProblem, solution: &Solution, result: &RangingResult) {
    println!("Feasibility conditions:");
    for condition in &result.conditions {
        let mark = if condition.verdict.is_ok() { "✓" } else { "✗" };
        println!(
            "  {} {:50}  {} = {:.2} ({})",
            mark, condition.condition, condition.name, condition.value, condition.verdict
        );
    }

    for &j in &result.basis_shifts {
        println!(
            "  ! perturbing {} changed the optimal basis; conditions involving Δ{} are unreliable",
            problem.constraints[j].name,
            j + 1
        );
    }

    println!();
    match result.impact {
        Some(profit) => {
            println!("Result: FEASIBLE");
            println!(
                "Z_new = {:.2} + {:.2} = {:.2}",
                solution.objective_value, profit.delta_z, profit.z_new
            );
        }
        None => {
            println!("Result: INFEASIBLE");
            println!("The optimal basis changes; shadow prices do not apply to this perturbation.");
        }
    }
}
