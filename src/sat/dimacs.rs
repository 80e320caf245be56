use std::{fs, io, path, str};
use std::io::{Read, Write};

use flate2::read::GzDecoder;

use crate::sat::formula::{Lit, Var};


/// A parsed DIMACS problem: the declared variable count and the clauses in
/// file order, as signed 1-based ids.
pub struct Formula {
    pub num_vars: usize,
    pub clauses: Vec<Vec<i32>>,
}

impl Formula {
    pub fn lits_of(&self, clause_index: usize) -> Vec<Lit> {
        self.clauses[clause_index].iter().map(|&id| lit_from_id(id)).collect()
    }
}

pub fn lit_from_id(id: i32) -> Lit {
    debug_assert!(id != 0);
    Var::from_index((id.abs() - 1) as usize).lit(id < 0)
}


fn parse_error(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("PARSE ERROR! {}", msg))
}


pub fn parse_file<P: AsRef<path::Path>>(path: P) -> io::Result<Formula> {
    let path = path.as_ref();
    let file = fs::File::open(path)?;
    if path.extension().map_or(false, |ext| ext == "gz") {
        parse(&mut GzDecoder::new(io::BufReader::new(file)))
    } else {
        parse(&mut io::BufReader::new(file))
    }
}

pub fn parse<R: io::Read>(stream: &mut R) -> io::Result<Formula> {
    DimacsParser::parse(stream)
}


/// Print the model one variable per line, preceding the verdict line.
pub fn write_model<W: Write>(stream: &mut W, model: &[bool]) -> io::Result<()> {
    for (index, &value) in model.iter().enumerate() {
        writeln!(stream, "x{} = {}", index + 1, value)?;
    }
    Ok(())
}


/// Independent satisfaction check: substitute the model into every clause
/// of the parsed formula.
pub fn check_model(formula: &Formula, model: &[bool]) -> bool {
    if model.len() < formula.num_vars {
        return false;
    }
    formula.clauses.iter().all(|clause| {
        clause.iter().any(|&id| {
            let value = model[(id.abs() - 1) as usize];
            if id < 0 {
                !value
            } else {
                value
            }
        })
    })
}


struct DimacsParser<'p> {
    reader: str::Chars<'p>,
    cur: Option<char>,
}

impl<'p> DimacsParser<'p> {
    pub fn parse<R: io::Read>(reader: &mut R) -> io::Result<Formula> {
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;

        let mut p = DimacsParser {
            reader: buf.chars(),
            cur: None,
        };
        p.next();
        p.parse_me()
    }

    fn parse_me(&mut self) -> io::Result<Formula> {
        // Comments, then the problem line.
        let (num_vars, num_clauses) = loop {
            self.skip_whitespace();
            match self.current() {
                Some('c') => self.skip_line(),
                Some('p') => {
                    self.consume("p cnf")?;
                    let vars = self.next_uint()?;
                    let clauses = self.next_uint()?;
                    break (vars, clauses);
                }
                Some(c) => {
                    return Err(parse_error(format!("expected header, found '{}'", c)));
                }
                None => {
                    return Err(parse_error("missing 'p cnf' header".to_string()));
                }
            }
        };

        let mut clauses = Vec::new();
        let mut current = Vec::new();
        let mut max_var_seen: usize = 0;

        loop {
            self.skip_whitespace();
            match self.current() {
                Some('c') => self.skip_line(),

                None => {
                    // A clause not closed by 0 at end of input is dropped.
                    if !current.is_empty() {
                        warn!("clause not terminated by 0 at end of input, ignored");
                    }
                    break;
                }

                _ => {
                    let id = self.next_int()?;
                    if id == 0 {
                        clauses.push(std::mem::replace(&mut current, Vec::new()));
                    } else {
                        max_var_seen = max_var_seen.max(id.abs() as usize);
                        current.push(id);
                    }
                }
            }
        }

        // The header may declare more variables than appear, never fewer.
        if max_var_seen > num_vars {
            return Err(parse_error(format!(
                "variable {} out of declared range 1..{}",
                max_var_seen, num_vars
            )));
        }

        if clauses.len() != num_clauses {
            return Err(parse_error(format!(
                "{} clauses declared, {} found",
                num_clauses,
                clauses.len()
            )));
        }

        Ok(Formula { num_vars, clauses })
    }


    #[inline]
    fn next(&mut self) {
        self.cur = self.reader.next();
    }

    #[inline]
    fn current(&self) -> Option<char> {
        self.cur
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.cur {
            if !c.is_whitespace() {
                break;
            }
            self.next();
        }
    }

    fn skip_line(&mut self) {
        loop {
            match self.cur {
                None => break,
                Some('\n') => {
                    self.next();
                    break;
                }
                _ => self.next(),
            }
        }
    }

    fn consume(&mut self, target: &str) -> io::Result<()> {
        for tc in target.chars() {
            match self.cur {
                Some(c) if c == tc => self.next(),
                _ => {
                    return Err(parse_error(format!("expected '{}'", target)));
                }
            }
        }
        Ok(())
    }

    fn read_int_body(&mut self) -> io::Result<usize> {
        let mut len: usize = 0;
        let mut value = 0;
        loop {
            match self.cur.and_then(|c| c.to_digit(10)) {
                Some(d) => {
                    value = value * 10 + (d as usize);
                    len += 1;
                    self.next();
                }

                _ if len > 0 => {
                    return Ok(value);
                }

                _ => {
                    return Err(parse_error("integer expected".to_string()));
                }
            }
        }
    }

    fn next_int(&mut self) -> io::Result<i32> {
        self.skip_whitespace();
        let sign = match self.cur {
            Some('+') => {
                self.next();
                1
            }
            Some('-') => {
                self.next();
                -1
            }
            _ => 1,
        };

        let val = self.read_int_body()?;
        Ok(sign * (val as i32))
    }

    fn next_uint(&mut self) -> io::Result<usize> {
        self.skip_whitespace();
        if let Some('+') = self.cur {
            self.next();
        }
        self.read_int_body()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(text: &str) -> io::Result<Formula> {
        parse(&mut text.as_bytes())
    }

    #[test]
    fn reads_header_comments_and_clauses() {
        let f = parse_str("c comment\np cnf 3 2\n1 -3 0\nc mid comment\n2 3 0\n").unwrap();
        assert_eq!(f.num_vars, 3);
        assert_eq!(f.clauses, vec![vec![1, -3], vec![2, 3]]);
    }

    #[test]
    fn tokens_may_span_lines() {
        let f = parse_str("p cnf 2 1\n1\n-2\n0\n").unwrap();
        assert_eq!(f.clauses, vec![vec![1, -2]]);
    }

    #[test]
    fn declared_vars_may_exceed_used() {
        let f = parse_str("p cnf 10 1\n1 2 0\n").unwrap();
        assert_eq!(f.num_vars, 10);
    }

    #[test]
    fn rejects_variable_out_of_range() {
        assert!(parse_str("p cnf 2 1\n1 3 0\n").is_err());
    }

    #[test]
    fn rejects_clause_count_mismatch() {
        assert!(parse_str("p cnf 2 3\n1 0\n-2 0\n").is_err());
    }

    #[test]
    fn rejects_missing_header() {
        assert!(parse_str("1 2 0\n").is_err());
    }

    #[test]
    fn unterminated_clause_is_discarded() {
        let f = parse_str("p cnf 2 1\n1 2 0\n-1 -2\n").unwrap();
        assert_eq!(f.clauses.len(), 1);
    }

    #[test]
    fn model_checker_substitutes_clauses() {
        let f = parse_str("p cnf 2 2\n1 2 0\n-1 0\n").unwrap();
        assert!(check_model(&f, &[false, true]));
        assert!(!check_model(&f, &[true, true]));
        assert!(!check_model(&f, &[false]));
    }
}
