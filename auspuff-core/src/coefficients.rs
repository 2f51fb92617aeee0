use std::fmt::{self, Write};

use crate::{Error, ImpulseResponse};

pub const DECIMALS: usize = 10;
pub const VALUES_PER_ROW: usize = 8;

/// Free-form description written into the header banner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub description: Option<String>,
    pub source: Option<String>,
}

/// A named, fixed-size coefficient array ready to be compiled into the
/// engine.
///
/// Renders as a self-contained C/C++ header declaring
/// `g_impulse_<name>[]` and `g_impulse_<name>_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTable {
    name: String,
    sample_rate: u32,
    coefficients: Vec<f64>,
    metadata: Metadata,
}

impl CoefficientTable {
    pub fn new(ir: &ImpulseResponse, name: &str, metadata: Metadata) -> Result<Self, Error> {
        if !is_identifier(name) {
            return Err(Error::InvalidIdentifier(name.to_string()));
        }

        if ir.is_empty() {
            return Err(Error::EmptyInput("impulse response has no coefficients"));
        }

        // `NaN` and `inf` have no C literal
        if let Some((i, c)) = ir.iter().enumerate().find(|(_, c)| !c.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "coefficient {i} is {c}, only finite values can be written"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            sample_rate: ir.sample_rate,
            coefficients: ir.data.clone(),
            metadata,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn array_ident(&self) -> String {
        format!("g_impulse_{}", self.name)
    }

    pub fn size_ident(&self) -> String {
        format!("g_impulse_{}_size", self.name)
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CoefficientTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.len();
        let duration_ms = n as f64 / self.sample_rate as f64 * 1000.0;

        writeln!(f, "// Impulse response: {}", self.name)?;
        if let Some(description) = &self.metadata.description {
            writeln!(f, "// {description}")?;
        }
        if let Some(source) = &self.metadata.source {
            writeln!(f, "// Source: {source}")?;
        }
        writeln!(
            f,
            "// Samples: {n} @ {} Hz ({duration_ms:.1} ms)",
            self.sample_rate
        )?;
        writeln!(f, "//")?;
        writeln!(f, "// Generated by auspuff. Select it in the engine config with:")?;
        writeln!(f, "//   \"impulse_preset\": \"{}\"", self.name)?;
        writeln!(f)?;
        writeln!(f, "#pragma once")?;
        writeln!(f)?;
        writeln!(f, "#include <stddef.h>")?;
        writeln!(f)?;
        writeln!(f, "static const double {}[] = {{", self.array_ident())?;

        let rows = self.coefficients.chunks(VALUES_PER_ROW);
        let last_row = rows.len().saturating_sub(1);
        for (i, row) in rows.enumerate() {
            let mut line = String::from("    ");
            for (j, c) in row.iter().enumerate() {
                if j > 0 {
                    line.push_str(", ");
                }
                write!(line, "{c:.prec$}", prec = DECIMALS)?;
            }
            if i < last_row {
                line.push(',');
            }
            writeln!(f, "{line}")?;
        }

        writeln!(f, "}};")?;
        writeln!(f)?;
        writeln!(f, "static const size_t {} = {n};", self.size_ident())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn table(data: Vec<f64>) -> CoefficientTable {
        let ir = ImpulseResponse::new(48_000, data);
        CoefficientTable::new(&ir, "test_ir", Metadata::default()).unwrap()
    }

    /// Pulls every decimal literal out of the array body.
    fn parse_literals(header: &str) -> Vec<f64> {
        let start = header.find("[] = {").unwrap() + "[] = {".len();
        let end = header[start..].find("};").unwrap() + start;

        header[start..end]
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().unwrap())
            .collect()
    }

    #[test]
    fn literals_round_trip() {
        let data: Vec<f64> = (0..37)
            .map(|i| f64::sin(i as f64 * 0.731) * f64::exp(-(i as f64) / 9.0))
            .collect();

        let header = table(data.clone()).render();
        let parsed = parse_literals(&header);

        assert_eq!(parsed.len(), data.len());
        for (a, b) in data.iter().zip(parsed) {
            assert!((a - b).abs() <= 1e-10);
        }
    }

    #[test]
    fn rows_of_eight() {
        let header = table(vec![0.5; 17]).render();

        let rows: Vec<_> = header
            .lines()
            .filter(|l| l.starts_with("    0."))
            .collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].matches("0.5000000000").count(), 8);
        assert!(rows[1].ends_with(','));
        assert_eq!(rows[2], "    0.5000000000");
    }

    #[test]
    fn non_finite_coefficients_are_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let ir = ImpulseResponse::new(48_000, vec![0.5, bad, -0.25]);

            let result = CoefficientTable::new(&ir, "broken", Metadata::default());

            assert!(matches!(result, Err(Error::InvalidParameter(_))));
        }
    }

    #[test]
    fn declarations() {
        let header = table(vec![1.0, -0.25]).render();

        assert!(header.contains("#pragma once"));
        assert!(header.contains("#include <stddef.h>"));
        assert!(header.contains("static const double g_impulse_test_ir[] = {"));
        assert!(header.contains("    1.0000000000, -0.2500000000\n};"));
        assert!(header.contains("static const size_t g_impulse_test_ir_size = 2;"));
        assert!(header.contains("\"impulse_preset\": \"test_ir\""));
        assert!(header.contains("// Samples: 2 @ 48000 Hz (0.0 ms)"));
    }

    #[test]
    fn metadata_in_banner() {
        let ir = ImpulseResponse::new(48_000, vec![1.0; 4_800]);
        let metadata = Metadata {
            description: Some("Diesel truck".to_string()),
            source: Some("synthesized: truck".to_string()),
        };

        let header = CoefficientTable::new(&ir, "truck", metadata).unwrap().render();

        assert!(header.starts_with("// Impulse response: truck\n// Diesel truck\n"));
        assert!(header.contains("// Source: synthesized: truck\n"));
        assert!(header.contains("(100.0 ms)"));
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("auto_4cil"));
        assert!(is_identifier("_x"));
        assert!(!is_identifier("4cil"));
        assert!(!is_identifier("my preset"));
        assert!(!is_identifier(""));

        let ir = ImpulseResponse::new(48_000, vec![1.0]);
        let result = CoefficientTable::new(&ir, "bad-name", Metadata::default());
        assert!(matches!(result, Err(Error::InvalidIdentifier(_))));
    }
}
