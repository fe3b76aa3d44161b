//! Canned Wireshark reference snippets and guide prompts.
//!
//! Built once at startup and shared read-only.

use serde::Serialize;

/// A reference snippet returned by the `wireshark_get_prompt(s)` tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptSnippet {
    pub id: String,
    pub text: String,
}

/// A guide exposed through MCP `prompts/list` / `prompts/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuidePrompt {
    pub name: String,
    pub description: String,
    #[serde(skip)]
    pub text: String,
}

const FILTERS: &str = "Common Wireshark display filters:
- By IP address: ip.addr == 192.168.1.1
- By port: tcp.port == 80 or udp.port == 53
- By protocol: http or dns or tcp
- HTTP requests: http.request.method == \"GET\"
- DNS names: dns.qry.name contains \"example.com\"
- Packet size: frame.len > 1000
- Combined: (ip.src == 192.168.1.1) && (tcp.port == 80)
";

const ANALYSIS: &str = "Basic network analysis steps:
1. Apply a filter to narrow the scope
2. Find key connections (SYN, SYN-ACK and the rest of the TCP handshake)
3. Look at response times and latency
4. Check for errors and retransmissions
5. Drill into the fields of specific protocols
6. Export important conversations to their own files
";

const COMMANDS: &str = "Useful tshark command lines:
- Capture packets: tshark -i <interface> -w <output.pcap>
- Read a capture file: tshark -r <input.pcap>
- Apply a display filter: tshark -r <input.pcap> -Y \"<display filter>\"
- Extract fields: tshark -r <input.pcap> -T fields -e <field>
- Statistics: tshark -r <input.pcap> -q -z <statistics>
";

const FILTER_GUIDE_EXAMPLES: &str = "
Example uses:
1. Traffic of one host: ip.addr == 10.0.0.1
2. HTTP GET requests: http.request.method == \"GET\"
3. DNS queries only: dns && dns.flags.response == 0
4. TCP retransmissions: tcp.analysis.retransmission
5. One service by port: tcp.port == 443 or udp.port == 53
";

const ANALYSIS_GUIDE_METHODS: &str = "
Methods:
- Summary statistics: Statistics > Protocol Hierarchy / Endpoints / Conversations
- Follow a TCP stream: right-click a packet > Follow > TCP Stream
- Protocol distribution: the \"protocols\" analysis type of wireshark_analyze
- Slow responses: filter with \"tcp.time_delta > 1\"
- HTTP errors: filter with \"http.response.code >= 400\"
";

/// Immutable store of snippets and guides.
#[derive(Debug, Clone)]
pub struct PromptStore {
    snippets: Vec<PromptSnippet>,
    guides: Vec<GuidePrompt>,
}

impl PromptStore {
    /// The built-in prompts.
    pub fn standard() -> Self {
        let snippet = |id: &str, text: &str| PromptSnippet {
            id: id.to_string(),
            text: text.to_string(),
        };

        Self {
            snippets: vec![
                snippet("wireshark_filters", FILTERS),
                snippet("wireshark_analysis", ANALYSIS),
                snippet("wireshark_commands", COMMANDS),
            ],
            guides: vec![
                GuidePrompt {
                    name: "wireshark_filter_guide".into(),
                    description: "Guide to writing Wireshark display filters".into(),
                    text: format!("{FILTERS}{FILTER_GUIDE_EXAMPLES}"),
                },
                GuidePrompt {
                    name: "wireshark_analysis_guide".into(),
                    description: "Step-by-step network analysis methods".into(),
                    text: format!("{ANALYSIS}{ANALYSIS_GUIDE_METHODS}"),
                },
            ],
        }
    }

    pub fn snippet(&self, id: &str) -> Option<&PromptSnippet> {
        self.snippets.iter().find(|s| s.id == id)
    }

    pub fn snippets(&self) -> &[PromptSnippet] {
        &self.snippets
    }

    pub fn guide(&self, name: &str) -> Option<&GuidePrompt> {
        self.guides.iter().find(|g| g.name == name)
    }

    pub fn guides(&self) -> &[GuidePrompt] {
        &self.guides
    }
}

impl Default for PromptStore {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_lookup() {
        let store = PromptStore::standard();
        assert_eq!(store.snippets().len(), 3);
        assert!(store.snippet("wireshark_filters").unwrap().text.contains("ip.addr"));
        assert!(store.snippet("missing").is_none());
    }

    #[test]
    fn test_guides_extend_snippets() {
        let store = PromptStore::standard();
        let guide = store.guide("wireshark_filter_guide").unwrap();
        assert!(guide.text.starts_with(FILTERS));
        assert!(guide.text.contains("tcp.analysis.retransmission"));
        assert!(store.guide("wireshark_analysis_guide").is_some());
    }
}
