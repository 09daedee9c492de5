//! Chemical formulas in the notation accepted by the correction backend
//!
//! Atoms are separated by `-` or whitespace, each optionally followed by a
//! quantity. Isotopes are written with their mass number in parentheses, so
//! enriched boron reads `La-(B11)5.94-(B10)0.06` and vanadium is just `V`.

use std::fmt;

// nom parser combinators
use nom::branch::alt;
use nom::bytes::complete::{take_while, take_while1};
use nom::character::complete::{self, char, multispace0, satisfy};
use nom::combinator::{all_consuming, map, map_res, opt, recognize};
use nom::multi::separated_list1;
use nom::number::complete::recognize_float;
use nom::sequence::{delimited, pair};
use nom::IResult;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Element symbols ordered by atomic number, `ELEMENTS[z - 1]`
pub const ELEMENTS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

// Heaviest known nuclides sit just under 300 nucleons
const MAX_MASS_NUMBER: u16 = 300;

/// Material as given in a configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    pub chemical_formula: String,
    /// Atoms per cubic Ångström
    pub number_density: f64,
}

/// One resolved atom of a formula
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Atom {
    pub symbol: String,
    pub atomic_number: u8,
    /// `None` for natural isotopic abundance
    pub mass_number: Option<u16>,
    pub quantity: f64,
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mass_number {
            Some(a) => write!(f, "({}{a})", self.symbol)?,
            None => write!(f, "{}", self.symbol)?,
        }
        if self.quantity != 1.0 {
            write!(f, "{}", self.quantity)?;
        }
        Ok(())
    }
}

/// A validated material: parsed formula plus number density
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub chemical_formula: String,
    pub number_density: f64,
    pub atoms: Vec<Atom>,
}

impl Material {
    /// Parse and resolve the formula, then check the density.
    pub fn from_config(config: &MaterialConfig) -> Result<Self> {
        let atoms = parse_formula(&config.chemical_formula)?;
        if !(config.number_density > 0.0 && config.number_density.is_finite()) {
            return Err(Error::Formula {
                formula: config.chemical_formula.clone(),
                reason: format!(
                    "number density must be positive, got {}",
                    config.number_density
                ),
            });
        }
        Ok(Material {
            chemical_formula: config.chemical_formula.clone(),
            number_density: config.number_density,
            atoms,
        })
    }
}

/// Atom as it appears in the text, before resolution
#[derive(Debug, PartialEq)]
struct RawAtom<'a> {
    symbol: &'a str,
    mass_number: Option<u16>,
    quantity: Option<f64>,
}

/// Parse a formula and resolve every symbol against the periodic table.
pub fn parse_formula(formula: &str) -> Result<Vec<Atom>> {
    let (_, raw) = all_consuming(delimited(
        multispace0,
        separated_list1(separator, atom),
        multispace0,
    ))(formula)
    .map_err(|e| Error::Formula {
        formula: formula.to_string(),
        reason: match e {
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                format!("unexpected input at '{}'", e.input)
            }
            nom::Err::Incomplete(_) => "incomplete input".to_string(),
        },
    })?;

    raw.into_iter().map(|a| resolve(formula, a)).collect()
}

fn resolve(formula: &str, raw: RawAtom<'_>) -> Result<Atom> {
    let unknown = || Error::UnknownElement {
        formula: formula.to_string(),
        symbol: match raw.mass_number {
            Some(a) => format!("{}{a}", raw.symbol),
            None => raw.symbol.to_string(),
        },
    };

    let z = ELEMENTS
        .iter()
        .position(|s| *s == raw.symbol)
        .ok_or_else(unknown)?
        + 1;

    if let Some(a) = raw.mass_number {
        if (a as usize) < z || a > MAX_MASS_NUMBER {
            return Err(unknown());
        }
    }

    let quantity = raw.quantity.unwrap_or(1.0);
    if !(quantity > 0.0 && quantity.is_finite()) {
        return Err(Error::Formula {
            formula: formula.to_string(),
            reason: format!("quantity of {} must be positive", raw.symbol),
        });
    }

    Ok(Atom {
        symbol: raw.symbol.to_string(),
        atomic_number: z as u8,
        mass_number: raw.mass_number,
        quantity,
    })
}

/// Element symbol: one capital letter and up to two lowercase letters
fn symbol(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_uppercase()),
        take_while(|c: char| c.is_ascii_lowercase()),
    ))(i)
}

/// Isotope in parentheses, e.g. `(B11)`
fn isotope(i: &str) -> IResult<&str, (&str, Option<u16>)> {
    delimited(
        char('('),
        pair(symbol, map(complete::u16, Some)),
        char(')'),
    )(i)
}

fn quantity(i: &str) -> IResult<&str, f64> {
    map_res(recognize_float, str::parse::<f64>)(i)
}

fn atom(i: &str) -> IResult<&str, RawAtom<'_>> {
    let (i, (symbol, mass_number)) = alt((isotope, map(symbol, |s| (s, None))))(i)?;
    let (i, quantity) = opt(quantity)(i)?;
    Ok((
        i,
        RawAtom {
            symbol,
            mass_number,
            quantity,
        },
    ))
}

fn separator(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c == '-' || c.is_whitespace())(i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn enriched_boride() {
        let atoms = parse_formula("La-(B11)5.94-(B10)0.06").unwrap();
        assert_eq!(atoms.len(), 3);

        assert_eq!(atoms[0].symbol, "La");
        assert_eq!(atoms[0].atomic_number, 57);
        assert_eq!(atoms[0].mass_number, None);
        assert_eq!(atoms[0].quantity, 1.0);

        assert_eq!(atoms[1].symbol, "B");
        assert_eq!(atoms[1].mass_number, Some(11));
        assert_eq!(atoms[1].quantity, 5.94);

        assert_eq!(atoms[2].mass_number, Some(10));
        assert_eq!(atoms[2].quantity, 0.06);
    }

    #[rstest]
    #[case("V", 1)]
    #[case("H2 O", 2)]
    #[case("(H2)2 O", 2)]
    #[case("  Si O2  ", 2)]
    #[case("Ca-Ti-O3", 3)]
    fn accepted_formulas(#[case] formula: &str, #[case] n_atoms: usize) {
        assert_eq!(parse_formula(formula).unwrap().len(), n_atoms);
    }

    #[rstest]
    #[case("")]
    #[case("la")]
    #[case("(B)5")]
    #[case("V--")]
    #[case("V$")]
    fn malformed_formulas(#[case] formula: &str) {
        assert!(matches!(
            parse_formula(formula),
            Err(Error::Formula { .. })
        ));
    }

    #[rstest]
    #[case("Xx")]
    #[case("La-(B4)")]
    #[case("(Fe400)")]
    fn unresolvable_formulas(#[case] formula: &str) {
        assert!(matches!(
            parse_formula(formula),
            Err(Error::UnknownElement { .. })
        ));
    }

    #[test]
    fn atoms_display_in_formula_notation() {
        let atoms = parse_formula("La-(B11)5.94").unwrap();
        let text: Vec<String> = atoms.iter().map(|a| a.to_string()).collect();
        assert_eq!(text, ["La", "(B11)5.94"]);
    }

    #[test]
    fn density_must_be_positive() {
        let config = MaterialConfig {
            chemical_formula: "V".into(),
            number_density: 0.0,
        };
        assert!(Material::from_config(&config).is_err());
    }
}
