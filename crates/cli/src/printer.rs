use std::io::Write;

use orka_core::ObjectRef;
use orka_label::ObjectPrinter;
use serde::Serialize;
use tracing::warn;

use crate::Output;

/// Writes labeled objects to a sink in the selected output format.
pub struct Printer<W: Write> {
    format: Output,
    out: W,
    dry_run: bool,
    printed: usize,
}

impl<W: Write> Printer<W> {
    pub fn new(format: Output, out: W, dry_run: bool) -> Self {
        Self { format, out, dry_run, printed: 0 }
    }

    #[cfg(test)]
    fn into_inner(self) -> W { self.out }

    fn render<K: Serialize>(&mut self, target: &ObjectRef, obj: &K) -> anyhow::Result<()> {
        match self.format {
            Output::Human => {
                let suffix = if self.dry_run { " (dry run)" } else { "" };
                writeln!(self.out, "{} labeled{}", target, suffix)?;
            }
            Output::Json => {
                writeln!(self.out, "{}", serde_json::to_string_pretty(obj)?)?;
            }
            Output::Yaml => {
                if self.printed > 0 { writeln!(self.out, "---")?; }
                write!(self.out, "{}", serde_yaml::to_string(obj)?)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<K: Serialize, W: Write> ObjectPrinter<K> for Printer<W> {
    fn print(&mut self, target: &ObjectRef, obj: &K) {
        match self.render(target, obj) {
            Ok(()) => self.printed += 1,
            Err(e) => warn!(target = %target, error = %e, "failed to print object"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(name: &str) -> serde_json::Value {
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": name, "labels": { "a": "b" } }
        })
    }

    fn print_two(format: Output, dry_run: bool) -> String {
        let mut p = Printer::new(format, Vec::new(), dry_run);
        p.print(&ObjectRef::new("pods", Some("test"), "foo"), &obj("foo"));
        p.print(&ObjectRef::new("pods", Some("test"), "bar"), &obj("bar"));
        String::from_utf8(p.into_inner()).unwrap()
    }

    #[test]
    fn human_lines() {
        assert_eq!(print_two(Output::Human, false), "pods/foo labeled\npods/bar labeled\n");
        assert_eq!(print_two(Output::Human, true), "pods/foo labeled (dry run)\npods/bar labeled (dry run)\n");
    }

    #[test]
    fn json_objects() {
        let out = print_two(Output::Json, false);
        let first: serde_json::Value = serde_json::Deserializer::from_str(&out)
            .into_iter::<serde_json::Value>()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(first["metadata"]["labels"]["a"], "b");
        assert_eq!(first["metadata"]["name"], "foo");
    }

    #[test]
    fn yaml_documents_are_separated() {
        let out = print_two(Output::Yaml, false);
        assert_eq!(out.matches("---\n").count(), 1);
        assert!(out.contains("name: foo"));
        assert!(out.contains("name: bar"));
    }
}
