use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::Sender;

use log::{debug, trace};

use crate::oracle::{Analysis, AnalysisRequest, Candidate, Oracle, OracleError, Score};

/// One parsed `info` line that carries a scored principal variation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: u32,
    pub multipv: usize,
    /// As the engine reports it: relative to the side to move.
    pub score: Score,
    pub bound: bool,
    pub first_move: String,
}

pub fn parse_info(line: &str) -> Option<InfoLine> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("info") { return None; }
    let mut depth = None;
    let mut multipv = 1usize;
    let mut score = None;
    let mut bound = false;
    let mut first_move = None;
    while let Some(tok) = tokens.next() {
        match tok {
            "depth" => depth = tokens.next().and_then(|s| s.parse::<u32>().ok()),
            "multipv" => multipv = tokens.next().and_then(|s| s.parse::<usize>().ok()).unwrap_or(1),
            "score" => {
                score = match (tokens.next(), tokens.next().and_then(|s| s.parse::<i32>().ok())) {
                    (Some("cp"), Some(v)) => Some(Score::Cp(v)),
                    (Some("mate"), Some(v)) => Some(Score::Mate(v)),
                    _ => None,
                }
            }
            "lowerbound" | "upperbound" => bound = true,
            "pv" => {
                first_move = tokens.next().map(str::to_string);
                break;
            }
            _ => {}
        }
    }
    Some(InfoLine { depth: depth?, multipv: multipv.max(1), score: score?, bound, first_move: first_move? })
}

pub fn go_command(request: &AnalysisRequest) -> String {
    let mut cmd = format!("go depth {}", request.depth);
    if !request.restrict_to.is_empty() {
        cmd.push_str(" searchmoves ");
        cmd.push_str(&request.restrict_to.join(" "));
    }
    cmd
}

fn white_to_move(fen: &str) -> bool { fen.split_whitespace().nth(1) != Some("b") }

/// Oracle backed by an external UCI engine process (Stockfish or similar).
pub struct UciOracle {
    path: String,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    threads: Option<usize>,
    multi_pv: Option<usize>,
}

impl UciOracle {
    pub fn spawn(path: &str) -> Result<Self, OracleError> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| OracleError::Spawn { path: path.to_string(), source })?;
        let stdin = child.stdin.take().ok_or(OracleError::Exited)?;
        let stdout = BufReader::new(child.stdout.take().ok_or(OracleError::Exited)?);
        let mut oracle = Self { path: path.to_string(), child, stdin, stdout, threads: None, multi_pv: None };
        oracle.send("uci")?;
        oracle.wait_for("uciok")?;
        oracle.send("isready")?;
        oracle.wait_for("readyok")?;
        debug!("engine {} ready", oracle.path);
        Ok(oracle)
    }

    fn send(&mut self, cmd: &str) -> Result<(), OracleError> {
        debug!("> {cmd}");
        writeln!(self.stdin, "{cmd}")?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, OracleError> {
        let mut buf = String::new();
        if self.stdout.read_line(&mut buf)? == 0 {
            return Err(OracleError::Exited);
        }
        let line = buf.trim().to_string();
        trace!("< {line}");
        Ok(line)
    }

    fn wait_for(&mut self, token: &str) -> Result<(), OracleError> {
        loop {
            if self.read_line()?.starts_with(token) { return Ok(()); }
        }
    }

    fn configure(&mut self, threads: usize, multi_pv: usize) -> Result<(), OracleError> {
        let mut changed = false;
        if self.threads != Some(threads) {
            self.send(&format!("setoption name Threads value {threads}"))?;
            self.threads = Some(threads);
            changed = true;
        }
        if self.multi_pv != Some(multi_pv) {
            self.send(&format!("setoption name MultiPV value {multi_pv}"))?;
            self.multi_pv = Some(multi_pv);
            changed = true;
        }
        if changed {
            self.send("isready")?;
            self.wait_for("readyok")?;
        }
        Ok(())
    }
}

fn snapshot(table: &[Option<Candidate>], depth: u32) -> Analysis {
    Analysis { candidates: table.iter().flatten().cloned().collect(), final_depth: depth }
}

impl Oracle for UciOracle {
    fn analyze(&mut self, request: &AnalysisRequest, updates: Option<&Sender<Analysis>>) -> Result<Analysis, OracleError> {
        let multi_pv = request.multi_pv.max(1);
        self.configure(request.threads.max(1), multi_pv)?;
        self.send(&format!("position fen {}", request.fen))?;
        self.send(&go_command(request))?;

        let white = white_to_move(&request.fen);
        let mut table: Vec<Option<Candidate>> = vec![None; multi_pv];
        let mut depth = 0u32;
        loop {
            let line = self.read_line()?;
            if line.starts_with("bestmove") { break; }
            let Some(info) = parse_info(&line) else { continue };
            if info.bound || info.multipv > multi_pv { continue; }
            if info.depth > depth {
                if depth > 0 {
                    if let Some(tx) = updates { let _ = tx.send(snapshot(&table, depth)); }
                }
                depth = info.depth;
            }
            table[info.multipv - 1] = Some(Candidate {
                mv: info.first_move,
                score: Score::from_side_to_move(info.score, white),
                depth: info.depth,
            });
        }
        let analysis = snapshot(&table, depth);
        if let Some(tx) = updates { let _ = tx.send(analysis.clone()); }
        Ok(analysis)
    }
}

impl Drop for UciOracle {
    fn drop(&mut self) {
        let _ = self.send("quit");
        let _ = self.child.wait();
    }
}
