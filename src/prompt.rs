use std::io::{BufRead, Write};

use tracing::debug;

use crate::config::{MIN_BLOCKS, Params, Weather};
use crate::rng::Rng;

const FALLBACK_SIDE: usize = 10;
const FALLBACK_DAYS: usize = 3;

/// Interactive console setup. Bad answers fall back to defaults instead of
/// failing; only the map size loops until it reaches `MIN_BLOCKS`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

fn positive(s: &str) -> Option<usize> {
    s.trim().parse::<usize>().ok().filter(|&v| v > 0)
}

fn yes_no(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "y" => Some(true),
        "n" => Some(false),
        _ => None,
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn say(&mut self, msg: &str) {
        // Console output is best-effort.
        writeln!(self.output, "{msg}").ok();
    }

    /// Print `question` and read one line. Read errors and EOF give an empty answer.
    fn ask(&mut self, question: &str) -> String {
        write!(self.output, "{question}").ok();
        self.output.flush().ok();
        let mut line = String::new();
        if let Err(e) = self.input.read_line(&mut line) {
            debug!("prompt read failed: {e}");
            line.clear();
        }
        line.trim().to_string()
    }

    fn ask_weather(&mut self, rng: &mut Rng) -> Weather {
        let rule = "=".repeat(30);
        self.say(&rule);
        self.say(" Please select a map option:");
        self.say(&"-".repeat(30));
        self.say(" 1. Normal Map");
        self.say(" 2. Snow Map");
        self.say(" 3. Rain Map");
        self.say(&rule);
        let mut choice = self.ask("I select map: ");
        if !matches!(choice.as_str(), "1" | "2" | "3") {
            self.say("Error: Invalid input. Selecting random map");
            choice = (rng.range_usize(3) + 1).to_string();
        }
        self.say(&rule);

        match choice.as_str() {
            "3" => {
                self.say("Rain map selected");
                let answer = self.ask("For how many hours will the rain stop?: ");
                let stop_rain = answer.parse::<u32>().unwrap_or_else(|_| {
                    self.say("Invalid input. Setting the rain stopping time to 0 by default");
                    0
                });
                Weather::Rain { stop_rain }
            }
            "2" => {
                self.say("Snow map selected");
                Weather::Snow
            }
            _ => {
                self.say("Normal map selected");
                Weather::Normal
            }
        }
    }

    fn ask_size(&mut self) -> (usize, usize) {
        let (mut rows, mut cols) = (0usize, 0usize);
        while rows.saturating_mul(cols) < MIN_BLOCKS {
            self.say(&format!("The minimum Block requirement is {MIN_BLOCKS} blocks"));
            // Both answers are read before either is checked.
            let r = positive(&self.ask("Please Input No. of Rows: "));
            let c = positive(&self.ask("Please Input No. of Columns: "));
            (rows, cols) = match (r, c) {
                (Some(r), Some(c)) => (r, c),
                _ => {
                    self.say("Error: Invalid input, setting Rows and Columns to 10.");
                    (FALLBACK_SIDE, FALLBACK_SIDE)
                }
            };

            if rows.saturating_mul(cols) < MIN_BLOCKS {
                self.say("Below the minimum Block requirement, Please try again");
                let again = self.ask("Do you want to change number of Rows? Y/N? ");
                match yes_no(&again) {
                    Some(true) => continue,
                    Some(false) => {
                        cols = positive(&self.ask("Please Re-Enter No. of Columns: "))
                            .unwrap_or_else(|| {
                                self.say("Error: Invalid input, setting Columns to 10");
                                FALLBACK_SIDE
                            });
                    }
                    None => self.say("Error: Invalid input, submit new values"),
                }
            }
        }
        (rows, cols)
    }

    fn ask_toggle(&mut self, question: &str, feature: &str) -> bool {
        let answer = self.ask(question);
        yes_no(&answer).unwrap_or_else(|| {
            self.say(&format!("Error: Invalid input. Setting up {feature} by default"));
            true
        })
    }

    /// Run the whole prompt sequence. Fields not asked about come from `base`.
    pub fn collect(&mut self, base: Params, rng: &mut Rng) -> Params {
        let weather = self.ask_weather(rng);
        let (rows, cols) = self.ask_size();

        let num_days = positive(&self.ask("How many days should the simulation showcase?: "))
            .unwrap_or_else(|| {
                self.say("Invalid input. Number of days set to 3");
                FALLBACK_DAYS
            });

        let add_forests = self.ask_toggle("Do you want to add a forest? (Y/N) ", "forest");
        let add_parks = self.ask_toggle("Do you want to add a park? (Y/N) ", "park");

        Params {
            rows,
            cols,
            num_days,
            add_forests,
            add_parks,
            weather,
            ..base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(script: &str) -> Params {
        let mut out = Vec::new();
        let mut p = Prompter::new(script.as_bytes(), &mut out);
        p.collect(Params::default(), &mut Rng::new(0))
    }

    #[test]
    fn happy_path() {
        let p = run("3\n4\n6\n5\n2\nn\ny\n");
        assert_eq!(p.weather, Weather::Rain { stop_rain: 4 });
        assert_eq!((p.rows, p.cols), (6, 5));
        assert_eq!(p.num_days, 2);
        assert!(!p.add_forests);
        assert!(p.add_parks);
    }

    #[test]
    fn bad_answers_fall_back() {
        let p = run("2\nabc\nx\n0\nmaybe\n?\n");
        assert_eq!(p.weather, Weather::Snow);
        assert_eq!((p.rows, p.cols), (10, 10));
        assert_eq!(p.num_days, 3);
        assert!(p.add_forests && p.add_parks);
    }

    #[test]
    fn negative_rain_delay_is_zero() {
        let p = run("3\n-2\n4\n4\n1\ny\ny\n");
        assert_eq!(p.weather, Weather::Rain { stop_rain: 0 });
    }

    #[test]
    fn invalid_map_option_is_random_but_valid() {
        for seed in 0..10 {
            let mut out = Vec::new();
            let mut p = Prompter::new("9\n0\n4\n4\n1\ny\ny\n".as_bytes(), &mut out);
            let params = p.collect(Params::default(), &mut Rng::new(seed));
            assert!(params.rows * params.cols >= MIN_BLOCKS);
            let text = String::from_utf8(out).unwrap();
            assert!(text.contains("Selecting random map"));
            assert!(text.contains(" map selected"));
        }
    }

    #[test]
    fn too_small_retries_with_new_rows() {
        // 2x3 is too small, retry both, then 3x4.
        let p = run("1\n2\n3\ny\n3\n4\n1\ny\ny\n");
        assert_eq!((p.rows, p.cols), (3, 4));
    }

    #[test]
    fn too_small_reenter_columns_only() {
        // 2x3 too small, keep rows, columns become 6.
        let p = run("1\n2\n3\nn\n6\n1\ny\ny\n");
        assert_eq!((p.rows, p.cols), (2, 6));
    }

    #[test]
    fn size_never_below_minimum() {
        let scripts = [
            "1\n1\n1\nn\n1\nn\n2\nq\n1\n11\nn\n12\n1\ny\ny\n",
            "1\n3\n3\ny\n2\n5\nn\n\n1\nn\nn\n",
            "1\n1\n11\n",
        ];
        for s in scripts {
            let p = run(s);
            assert!(p.rows * p.cols >= MIN_BLOCKS, "{s:?} -> {}x{}", p.rows, p.cols);
        }
    }

    #[test]
    fn invalid_rows_still_consumes_columns_answer() {
        let p = run("1\n0\n5\n2\nn\nn\n");
        assert_eq!((p.rows, p.cols), (10, 10));
        assert_eq!(p.num_days, 2);
        assert!(!p.add_forests);
        assert!(!p.add_parks);
    }

    #[test]
    fn huge_sizes_do_not_overflow() {
        let script = format!("1\n{max}\n{max}\n1\ny\ny\n", max = usize::MAX);
        let p = run(&script);
        assert_eq!((p.rows, p.cols), (usize::MAX, usize::MAX));
        assert_eq!(p.num_days, 1);
    }

    #[test]
    fn eof_terminates_with_defaults() {
        let p = run("");
        assert_eq!((p.rows, p.cols), (10, 10));
        assert_eq!(p.num_days, 3);
    }
}
