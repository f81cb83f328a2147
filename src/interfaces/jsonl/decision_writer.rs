use crate::domain::payment::DecisionResponse;
use crate::error::Result;
use std::io::Write;

/// Writes decision responses as JSON lines.
pub struct DecisionWriter<W: Write> {
    writer: W,
}

impl<W: Write> DecisionWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write(&mut self, response: &DecisionResponse) -> Result<()> {
        serde_json::to_writer(&mut self.writer, response)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::{AgentStep, Decision, Reason};

    #[test]
    fn test_writes_one_line_per_response() {
        let mut buffer = Vec::new();
        let mut writer = DecisionWriter::new(&mut buffer);
        let response = DecisionResponse {
            decision: Decision::Block,
            reasons: vec![Reason::InsufficientFunds],
            agent_trace: vec![AgentStep::new("tool:recommend", "block due to rule violation")],
            request_id: "req_1".to_string(),
        };
        writer.write(&response).unwrap();
        writer.write(&response).unwrap();
        writer.flush().unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: DecisionResponse = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, response);
    }
}
