//! Codebook - wildcard-expanded codeword/response tables
//!
//! The accelerator stores five trits (ten raw bits) per eight-bit codeword.
//! The mapping between codewords and raw bit groups is not computed in
//! hardware terms here; it is a lookup table built once at startup from the
//! decoder's stimulus/response listing:
//!
//! - a *stimulus* is a codeword pattern over `{0, 1, X}` (`X` = don't-care),
//! - a *response* is the concrete raw bit group the decoder emits for it.
//!
//! Wildcards are expanded at build time into a flat map (a pattern with `w`
//! wildcards yields `2^w` concrete codewords), never re-expanded per lookup.
//! Two different patterns expanding to the same concrete codeword would make
//! the table ambiguous, so that aborts the build. The encode direction
//! (raw group -> codeword) keeps the first matching entry in table order,
//! which is the choice the RTL was verified against.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, TritgenError};

/// Bidirectional codeword/response table
#[derive(Debug, Clone)]
pub struct Codebook {
    /// Concrete codeword -> raw response group (decode direction)
    forward: HashMap<String, String>,
    /// Original, possibly wildcarded patterns in table order
    canonical: Vec<(String, String)>,
    /// Raw response group -> first matching concrete codeword (encode direction)
    encode: HashMap<String, String>,
    /// Width of one concrete codeword
    codeword_width: usize,
    /// Width of one raw response group
    group_width: usize,
}

impl Codebook {
    /// Build the table from parallel stimulus/response listings
    ///
    /// Preconditions: equal listing lengths, one common stimulus width over
    /// `{0,1,X}`, one common response width over `{0,1}`. Empty listings
    /// build an empty table; every later lookup against it fails.
    pub fn build<S: AsRef<str>, R: AsRef<str>>(stimuli: &[S], responses: &[R]) -> Result<Self> {
        if stimuli.len() != responses.len() {
            return Err(TritgenError::Codebook(format!(
                "{} stimuli but {} responses",
                stimuli.len(),
                responses.len()
            )));
        }

        let mut forward = HashMap::new();
        let mut canonical = Vec::with_capacity(stimuli.len());
        let mut encode = HashMap::new();
        // Concrete codeword -> table row that produced it, for collision reports.
        let mut origin: HashMap<String, usize> = HashMap::new();
        let mut codeword_width = 0;
        let mut group_width = 0;

        for (row, (stimulus, response)) in stimuli.iter().zip(responses).enumerate() {
            let stimulus = stimulus.as_ref();
            let response = response.as_ref();

            if let Some(c) = stimulus.chars().find(|c| !matches!(c, '0' | '1' | 'X')) {
                return Err(TritgenError::Codebook(format!(
                    "row {}: invalid character {:?} in stimulus {:?}",
                    row, c, stimulus
                )));
            }
            if let Some(c) = response.chars().find(|c| !matches!(c, '0' | '1')) {
                return Err(TritgenError::Codebook(format!(
                    "row {}: invalid character {:?} in response {:?}",
                    row, c, response
                )));
            }
            if row == 0 {
                codeword_width = stimulus.len();
                group_width = response.len();
            }
            if stimulus.len() != codeword_width {
                return Err(TritgenError::Codebook(format!(
                    "row {}: stimulus width {} != {}",
                    row,
                    stimulus.len(),
                    codeword_width
                )));
            }
            if response.len() != group_width {
                return Err(TritgenError::Codebook(format!(
                    "row {}: response width {} != {}",
                    row,
                    response.len(),
                    group_width
                )));
            }

            for concrete in expand_wildcards(stimulus) {
                if let Some(&other) = origin.get(&concrete) {
                    return Err(TritgenError::Codebook(format!(
                        "codeword {:?} produced by both row {} ({:?}) and row {} ({:?})",
                        concrete, other, stimuli[other].as_ref(), row, stimulus
                    )));
                }
                origin.insert(concrete.clone(), row);
                // First matching codeword wins the encode direction.
                encode
                    .entry(response.to_string())
                    .or_insert_with(|| concrete.clone());
                forward.insert(concrete, response.to_string());
            }
            canonical.push((stimulus.to_string(), response.to_string()));
        }

        Ok(Self {
            forward,
            canonical,
            encode,
            codeword_width,
            group_width,
        })
    }

    /// Load the table from the decoder's stimulus/response files
    /// (one pattern per line)
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(
        stimuli_path: P,
        responses_path: Q,
    ) -> Result<Self> {
        let stimuli = read_lines(stimuli_path.as_ref())?;
        let responses = read_lines(responses_path.as_ref())?;
        Self::build(&stimuli, &responses)
    }

    /// Synthesize the complete base-3 table: every 5-trit group (10 raw
    /// bits) paired with its base-3 byte, first trit most significant.
    ///
    /// This is a bijection over all 243 representable groups, used as the
    /// default table and by exhaustive coverage tests.
    pub fn base3() -> Self {
        const SYMBOLS: [&str; 3] = ["00", "01", "11"];

        let mut stimuli = Vec::with_capacity(243);
        let mut responses = Vec::with_capacity(243);
        for value in 0..243usize {
            let mut digits = [0usize; 5];
            let mut rest = value;
            for d in digits.iter_mut().rev() {
                *d = rest % 3;
                rest /= 3;
            }
            let response: String = digits.iter().map(|&d| SYMBOLS[d]).collect();
            stimuli.push(format!("{:08b}", value));
            responses.push(response);
        }
        // A generated bijection cannot collide.
        Self::build(&stimuli, &responses).unwrap_or_else(|e| unreachable!("{}", e))
    }

    /// Width of one concrete codeword
    pub fn codeword_width(&self) -> usize {
        self.codeword_width
    }

    /// Width of one raw response group
    pub fn group_width(&self) -> usize {
        self.group_width
    }

    /// Number of concrete table entries
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// True for a table built from empty listings
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// The canonical (unexpanded) table rows in input order
    pub fn canonical(&self) -> &[(String, String)] {
        &self.canonical
    }

    /// Encode one raw bit group into its codeword
    ///
    /// A group without a table entry is a coverage gap: the generated
    /// pattern cannot be represented and the run must halt.
    pub fn encode_group(&self, group: &str) -> Result<&str> {
        self.encode.get(group).map(String::as_str).ok_or_else(|| {
            TritgenError::Codebook(format!(
                "no codeword covers raw group {:?} ({} canonical entries)",
                group,
                self.canonical.len()
            ))
        })
    }

    /// Decode one concrete codeword into its raw bit group
    pub fn decode_codeword(&self, codeword: &str) -> Result<&str> {
        self.forward.get(codeword).map(String::as_str).ok_or_else(|| {
            TritgenError::Codebook(format!("no table entry for codeword {:?}", codeword))
        })
    }
}

/// Expand every `X` position into both concrete values
///
/// A pattern with `w` wildcards yields `2^w` concrete strings. Concrete
/// patterns pass through as a single entry.
fn expand_wildcards(pattern: &str) -> Vec<String> {
    let mut pending = vec![pattern.to_string()];
    let mut concrete = Vec::new();

    while let Some(current) = pending.pop() {
        match current.find('X') {
            None => concrete.push(current),
            Some(pos) => {
                let mut one = current.clone();
                one.replace_range(pos..pos + 1, "1");
                let mut zero = current;
                zero.replace_range(pos..pos + 1, "0");
                pending.push(one);
                pending.push(zero);
            }
        }
    }

    concrete
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(|l| l.trim_end().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_concrete_passthrough() {
        assert_eq!(expand_wildcards("0110"), vec!["0110".to_string()]);
    }

    #[test]
    fn test_expand_counts() {
        assert_eq!(expand_wildcards("X0").len(), 2);
        assert_eq!(expand_wildcards("XX").len(), 4);
        assert_eq!(expand_wildcards("X0X1X").len(), 8);

        let mut all = expand_wildcards("XX");
        all.sort();
        assert_eq!(all, vec!["00", "01", "10", "11"]);
    }

    #[test]
    fn test_build_and_lookup() {
        let book = Codebook::build(&["00X", "010"], &["0000", "1111"]).unwrap();
        assert_eq!(book.codeword_width(), 3);
        assert_eq!(book.group_width(), 4);
        assert_eq!(book.len(), 3); // 001, 000, 010

        assert_eq!(book.decode_codeword("001").unwrap(), "0000");
        assert_eq!(book.decode_codeword("000").unwrap(), "0000");
        assert_eq!(book.decode_codeword("010").unwrap(), "1111");
        assert_eq!(book.encode_group("1111").unwrap(), "010");
        assert!(book.decode_codeword("111").is_err());
        assert!(book.encode_group("0101").is_err());
    }

    #[test]
    fn test_encode_first_wins() {
        // Both rows respond "11"; the first row's first expansion wins.
        let book = Codebook::build(&["1X", "00"], &["11", "11"]).unwrap();
        let chosen = book.encode_group("11").unwrap();
        assert!(chosen == "10" || chosen == "11");
        // Whatever expansion order, it must come from the first pattern.
        assert!(chosen.starts_with('1'));
    }

    #[test]
    fn test_collision_is_an_error() {
        // "0X" expands to {00, 01}; "01" collides.
        let err = Codebook::build(&["0X", "01"], &["00", "11"]).unwrap_err();
        assert!(matches!(err, TritgenError::Codebook(_)));
        assert!(err.to_string().contains("01"));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(Codebook::build(&["00"], &["0", "1"]).is_err());
        assert!(Codebook::build(&["00", "0X"], &["0"]).is_err());
    }

    #[test]
    fn test_inconsistent_widths_rejected() {
        assert!(Codebook::build(&["00", "000"], &["0", "1"]).is_err());
        assert!(Codebook::build(&["00", "01"], &["0", "11"]).is_err());
    }

    #[test]
    fn test_bad_alphabet_rejected() {
        assert!(Codebook::build(&["0Y"], &["00"]).is_err());
        assert!(Codebook::build(&["00"], &["0X"]).is_err());
    }

    #[test]
    fn test_empty_table() {
        let book = Codebook::build::<&str, &str>(&[], &[]).unwrap();
        assert!(book.is_empty());
        assert!(book.encode_group("0000000000").is_err());
        assert!(book.decode_codeword("00000000").is_err());
    }

    #[test]
    fn test_base3_is_total_and_bijective() {
        let book = Codebook::base3();
        assert_eq!(book.len(), 243);
        assert_eq!(book.codeword_width(), 8);
        assert_eq!(book.group_width(), 10);

        // Every 5-trit group has exactly one codeword, and decoding it
        // returns the group.
        let symbols = ["00", "01", "11"];
        let mut seen = std::collections::HashSet::new();
        for value in 0..243usize {
            let mut digits = [0usize; 5];
            let mut rest = value;
            for d in digits.iter_mut().rev() {
                *d = rest % 3;
                rest /= 3;
            }
            let group: String = digits.iter().map(|&d| symbols[d]).collect();
            let codeword = book.encode_group(&group).unwrap().to_string();
            assert!(seen.insert(codeword.clone()), "duplicate codeword {}", codeword);
            assert_eq!(book.decode_codeword(&codeword).unwrap(), group);
        }
    }

    #[test]
    fn test_from_files() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let stim_path = dir.path().join("decoder_stimuli.txt");
        let resp_path = dir.path().join("decoder_exp_responses.txt");
        let mut f = std::fs::File::create(&stim_path).unwrap();
        writeln!(f, "0X").unwrap();
        writeln!(f, "10").unwrap();
        let mut f = std::fs::File::create(&resp_path).unwrap();
        writeln!(f, "0011").unwrap();
        writeln!(f, "1100").unwrap();

        let book = Codebook::from_files(&stim_path, &resp_path).unwrap();
        assert_eq!(book.len(), 3);
        assert_eq!(book.decode_codeword("10").unwrap(), "1100");
    }
}
