use std::fs;
use std::path::Path;
use std::path::PathBuf;

use ampliclust::command::{CountClusterReads, ExtractClusters, Pipeline, RemoveSingletons};
use ampliclust::fileformat::read_fasta_records;

struct Layout {
    _tmp: tempfile::TempDir,
    table: PathBuf,
    universe: PathBuf,
    clusters: PathBuf,
    samples: PathBuf,
    rawseqids: PathBuf,
    counts: PathBuf,
}

fn layout(table: &str, universe: &str) -> Layout {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().to_path_buf();
    let l = Layout {
        table: root.join("output_cluster.tsv"),
        universe: root.join("hq.fasta"),
        clusters: root.join("mmseqs2_clusters"),
        samples: root.join("fastq"),
        rawseqids: root.join("rawseqids"),
        counts: root.join("counts"),
        _tmp: tmp,
    };
    fs::write(&l.table, table).unwrap();
    fs::write(&l.universe, universe).unwrap();
    fs::create_dir(&l.samples).unwrap();
    fs::create_dir(&l.rawseqids).unwrap();
    l
}

fn add_sample(l: &Layout, name: &str, read_ids: &[&str]) {
    add_sample_without_ids(l, name);
    let content: String = read_ids.iter().map(|id| format!("{}\n", id)).collect();
    fs::write(l.rawseqids.join(format!("rawseqids_{}", name)), content).unwrap();
}

fn add_sample_without_ids(l: &Layout, name: &str) {
    fs::write(l.samples.join(format!("{}.fastq", name)), "").unwrap();
}

fn ids_in(p: &Path) -> Vec<String> {
    read_fasta_records(p)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect()
}

fn extract(l: &Layout) {
    let report = ExtractClusters::run(&ExtractClusters {
        path_table: l.table.clone(),
        path_universe: l.universe.clone(),
        path_out: l.clusters.clone(),
        num_threads: 2,
    })
    .unwrap();
    report.check().unwrap();
}

fn filter(l: &Layout, min_members: usize) -> Vec<String> {
    RemoveSingletons::run(&RemoveSingletons {
        path_clusters: l.clusters.clone(),
        min_members,
        num_threads: 2,
    })
    .unwrap()
    .kept()
    .into_iter()
    .map(|c| c.name)
    .collect()
}

fn count(l: &Layout) -> ampliclust::command::CountReport {
    CountClusterReads::run(&CountClusterReads {
        path_clusters: l.clusters.clone(),
        path_samples: l.samples.clone(),
        path_rawseqids: l.rawseqids.clone(),
        path_out: l.counts.clone(),
        num_threads: 2,
    })
    .unwrap()
}

const TABLE_A: &str = "C1\ts1\nC1\ts2\nC2\ts3\n";
const UNIVERSE_A: &str = ">s1\nACGT\n>s2\nACGA\n>s3\nTTTT\n>C1\nACGG\n>C2\nTTTA\n";

#[test]
fn extract_two_clusters() {
    let l = layout(TABLE_A, UNIVERSE_A);
    extract(&l);

    assert_eq!(ids_in(&l.clusters.join("cluster1")), vec!["s1", "s2"]);
    assert_eq!(ids_in(&l.clusters.join("centroid_cluster1.fasta")), vec!["C1"]);
    assert_eq!(ids_in(&l.clusters.join("cluster2")), vec!["s3"]);
    assert_eq!(ids_in(&l.clusters.join("centroid_cluster2.fasta")), vec!["C2"]);
}

#[test]
fn filter_removes_singleton_cluster() {
    let l = layout(TABLE_A, UNIVERSE_A);
    extract(&l);
    let kept = filter(&l, 2);

    assert_eq!(kept, vec!["cluster1"]);
    assert!(l.clusters.join("cluster1").exists());
    assert!(l.clusters.join("centroid_cluster1.fasta").exists());
    assert!(!l.clusters.join("cluster2").exists());
    assert!(!l.clusters.join("centroid_cluster2.fasta").exists());

    //Running again keeps the same clusters
    assert_eq!(filter(&l, 2), kept);
}

#[test]
fn count_sample_reads_in_cluster() {
    let l = layout(TABLE_A, UNIVERSE_A);
    add_sample(&l, "sampleA", &["s1", "s3"]);
    extract(&l);
    filter(&l, 2);
    let report = count(&l);

    assert!(report.failed.is_empty());
    let content = fs::read_to_string(l.counts.join("cluster1_seq_count")).unwrap();
    assert_eq!(content, "sampleA\t1\n");
    assert!(!l.counts.join("cluster2_seq_count").exists());
}

#[test]
fn missing_sample_is_skipped_with_one_warning() {
    let l = layout(TABLE_A, UNIVERSE_A);
    add_sample(&l, "a", &["s1", "s2"]);
    add_sample_without_ids(&l, "b");
    add_sample(&l, "c", &["s9"]);
    extract(&l);
    filter(&l, 2);
    let report = count(&l);

    assert_eq!(report.missing_samples, vec!["b"]);
    let content = fs::read_to_string(l.counts.join("cluster1_seq_count")).unwrap();
    assert_eq!(content, "a\t2\nc\t0\n");
}

#[test]
fn cluster_equal_to_a_sample() {
    let table = "C1\tr1\nC1\tr2\nC1\tr3\nC2\tq1\nC2\tq2\n";
    let universe = ">r1\nA\n>r2\nC\n>r3\nG\n>q1\nT\n>q2\nA\n>C1\nA\n";
    let l = layout(table, universe);
    add_sample(&l, "same", &["r1", "r2", "r3"]);
    add_sample(&l, "disjoint", &["x1", "x2"]);
    extract(&l);
    filter(&l, 2);
    let report = count(&l);

    assert_eq!(
        report.matrix.rows_for("cluster1").unwrap(),
        vec![("disjoint", 0), ("same", 3)]
    );
    //No centroid in the universe for the second cluster; it is still counted
    assert!(!l.clusters.join("centroid_cluster2.fasta").exists());
    assert_eq!(
        report.matrix.rows_for("cluster2").unwrap(),
        vec![("disjoint", 0), ("same", 0)]
    );
}

#[test]
fn counts_are_bounded() {
    let table = "C1\ts1\nC1\ts2\nC1\ts3\nC2\ts4\nC2\ts5\nC2\ts2\n";
    let universe = ">s1\nA\n>s2\nA\n>s3\nA\n>s4\nA\n>s5\nA\n";
    let l = layout(table, universe);
    let samples: Vec<(&str, Vec<&str>)> = vec![
        ("x", vec!["s1", "s4", "s7"]),
        ("y", vec!["s2"]),
        ("z", vec!["s1", "s2", "s3", "s4", "s5", "s6"]),
    ];
    for (name, ids) in &samples {
        add_sample(&l, name, ids.as_slice());
    }
    extract(&l);
    filter(&l, 2);
    let report = count(&l);

    for (ci, cluster) in report.matrix.clusters.iter().enumerate() {
        let cluster_size = ids_in(&l.clusters.join(&cluster.name)).len();
        for (si, (_, ids)) in samples.iter().enumerate() {
            let c = report.matrix.counts[ci][si];
            assert!(c <= cluster_size.min(ids.len()));
        }
    }
}

#[test]
fn duplicate_table_rows_inflate_members_file() {
    let l = layout("C1\ts1\nC1\ts1\nC1\tmissing\n", ">s1\nA\n>C1\nA\n");
    extract(&l);
    assert_eq!(ids_in(&l.clusters.join("cluster1")), vec!["s1", "s1"]);

    //Two records, so the cluster survives the default threshold
    assert_eq!(filter(&l, 2), vec!["cluster1"]);
}

#[test]
fn rerun_with_fewer_clusters_leaves_no_old_counts_behind() {
    let l = layout(TABLE_A, UNIVERSE_A);
    add_sample(&l, "sampleA", &["s1", "s2", "s3"]);
    extract(&l);

    fs::write(&l.table, "C1\ts1\nC1\ts2\n").unwrap();
    extract(&l);
    assert!(!l.clusters.join("cluster2").exists());
    assert!(!l.clusters.join("centroid_cluster2.fasta").exists());

    assert_eq!(filter(&l, 1), vec!["cluster1"]);
    let report = count(&l);
    assert!(!l.counts.join("cluster2_seq_count").exists());
    assert_eq!(report.matrix.num_clusters(), 1);
}

#[test]
fn whole_pipeline() {
    let l = layout(TABLE_A, UNIVERSE_A);
    add_sample(&l, "sampleA", &["s1", "s3"]);
    add_sample(&l, "sampleB", &["s2"]);

    let report = Pipeline::run(&Pipeline {
        path_table: l.table.clone(),
        path_universe: l.universe.clone(),
        path_samples: l.samples.clone(),
        path_rawseqids: l.rawseqids.clone(),
        path_clusters: l.clusters.clone(),
        path_out: l.counts.clone(),
        min_members: 2,
        num_threads: 1,
    })
    .unwrap();

    let names: Vec<&str> = report.matrix.clusters.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["cluster1"]);
    let content = fs::read_to_string(l.counts.join("cluster1_seq_count")).unwrap();
    assert_eq!(content, "sampleA\t1\nsampleB\t1\n");
}

#[test]
fn pipeline_stops_before_extraction_without_sample_dir() {
    let l = layout(TABLE_A, UNIVERSE_A);
    let res = Pipeline::run(&Pipeline {
        path_table: l.table.clone(),
        path_universe: l.universe.clone(),
        path_samples: l.samples.join("missing"),
        path_rawseqids: l.rawseqids.clone(),
        path_clusters: l.clusters.clone(),
        path_out: l.counts.clone(),
        min_members: 2,
        num_threads: 1,
    });
    assert!(res.is_err());
    assert!(!l.clusters.exists());
}
