//! XDMF index documents.
//!
//! The index files let visualisation tools open a checkpoint: they
//! reference the payload files by name and record the model time.

use std::fmt::Write;

use lithos_mesh::CartesianMesh;

/// One attribute referenced by an index document.
#[derive(Debug, Clone, PartialEq)]
pub struct XdmfAttribute {
    pub name: String,
    pub file: String,
    pub components: usize,
}

impl XdmfAttribute {
    pub fn new(name: impl Into<String>, file: impl Into<String>, components: usize) -> Self {
        Self { name: name.into(), file: file.into(), components }
    }
}

const HEADER: &str = "<?xml version=\"1.0\" ?>\n<Xdmf xmlns:xi=\"http://www.w3.org/2001/XInclude\" Version=\"2.0\">\n<Domain>\n";
const FOOTER: &str = "</Domain>\n</Xdmf>\n";

fn attribute_type(components: usize) -> &'static str {
    match components {
        1 => "Scalar",
        2 | 3 => "Vector",
        _ => "Tensor6",
    }
}

fn write_attributes(out: &mut String, center: &str, entries: usize, attrs: &[XdmfAttribute]) {
    for a in attrs {
        let _ = writeln!(
            out,
            "  <Attribute Type=\"{}\" Center=\"{center}\" Name=\"{}\">\n    <DataItem Format=\"Binary\" Dimensions=\"{entries} {}\">{}</DataItem>\n  </Attribute>",
            attribute_type(a.components),
            a.name,
            a.components,
            a.file
        );
    }
}

/// Index of a field checkpoint: mesh topology plus node attributes.
pub fn fields_document(mesh_file: &str, mesh: &CartesianMesh, time: f64, attrs: &[XdmfAttribute]) -> String {
    let nodes = mesh.nodes_per_axis();
    let axes = mesh.dim.axes();
    let topology = if axes == 2 { "2DSMesh" } else { "3DSMesh" };
    let dims: Vec<String> = nodes[..axes].iter().rev().map(|n| n.to_string()).collect();

    let mut out = String::from(HEADER);
    let _ = writeln!(out, "<Grid Name=\"FEM_Mesh\">");
    let _ = writeln!(out, "  <Time Value=\"{time:e}\" />");
    let _ = writeln!(out, "  <Topology Type=\"{topology}\" NumberOfElements=\"{}\" />", dims.join(" "));
    let _ = writeln!(
        out,
        "  <Geometry Type=\"XYZ\">\n    <DataItem Format=\"Binary\" Dimensions=\"{} 3\">{mesh_file}</DataItem>\n  </Geometry>",
        mesh.node_count()
    );
    write_attributes(&mut out, "Node", mesh.node_count(), attrs);
    out.push_str("</Grid>\n");
    out.push_str(FOOTER);
    out
}

/// Index of a swarm checkpoint: particle positions plus swarm variables.
pub fn swarm_document(swarm_file: &str, particles: usize, time: f64, attrs: &[XdmfAttribute]) -> String {
    let mut out = String::from(HEADER);
    let _ = writeln!(out, "<Grid Name=\"Swarm\">");
    let _ = writeln!(out, "  <Time Value=\"{time:e}\" />");
    let _ = writeln!(out, "  <Topology Type=\"POLYVERTEX\" NodesPerElement=\"{particles}\" />");
    let _ = writeln!(
        out,
        "  <Geometry Type=\"XYZ\">\n    <DataItem Format=\"Binary\" Dimensions=\"{particles} 3\">{swarm_file}</DataItem>\n  </Geometry>"
    );
    write_attributes(&mut out, "Node", particles, attrs);
    out.push_str("</Grid>\n");
    out.push_str(FOOTER);
    out
}
