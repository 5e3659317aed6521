//! GLSL source assembly.
//!
//! Each program is a GLSL body plus a header of `const` declarations. The
//! header is written from the Rust constants the host-side math uses.

const VERSION: &str = "#version 300 es\nprecision highp float;\n\n";

#[derive(Debug, Clone)]
pub struct ShaderSource {
    text: String,
}

impl Default for ShaderSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderSource {
    pub fn new() -> Self {
        Self {
            text: VERSION.to_owned(),
        }
    }

    pub fn float(mut self, name: &str, value: f32) -> Self {
        self.text
            .push_str(&format!("const float {name} = {};\n", float_literal(value)));
        self
    }

    pub fn uint(mut self, name: &str, value: u32) -> Self {
        self.text.push_str(&format!("const uint {name} = {value}u;\n"));
        self
    }

    pub fn vec2_array(mut self, name: &str, values: &[[f32; 2]]) -> Self {
        let items: Vec<String> = values
            .iter()
            .map(|[x, y]| format!("vec2({}, {})", float_literal(*x), float_literal(*y)))
            .collect();
        self.text.push_str(&format!(
            "const vec2 {name}[{}] = vec2[](\n  {}\n);\n",
            values.len(),
            items.join(",\n  ")
        ));
        self
    }

    pub fn finish(self, body: &str) -> String {
        self.text + "\n" + body
    }
}

/// GLSL ES has no implicit int to float conversion, so every literal needs
/// a fraction or an exponent. `Debug` for `f32` always prints one.
fn float_literal(value: f32) -> String {
    format!("{value:?}")
}

/// Right-hand sides of every `const` declaration of `name` in `source`.
#[cfg(test)]
pub(crate) fn declarations<'a>(source: &'a str, name: &str) -> Vec<&'a str> {
    source
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("const "))
        .filter_map(|decl| decl.split_once(' ').map(|(_ty, rest)| rest))
        .filter_map(|rest| rest.split_once(" = "))
        .filter(|(lhs, _)| lhs.split('[').next() == Some(name))
        .map(|(_, rhs)| rhs.trim_end_matches(';'))
        .collect()
}

/// The single value `source` declares for float `name`.
#[cfg(test)]
pub(crate) fn declared_float(source: &str, name: &str) -> f32 {
    let decls = declarations(source, name);
    assert_eq!(decls.len(), 1, "{name} declared {} times", decls.len());
    decls[0]
        .parse()
        .unwrap_or_else(|_| panic!("{name} = {} is not a float", decls[0]))
}
