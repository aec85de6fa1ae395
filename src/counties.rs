use indexmap::IndexMap;

/// Official homepages of all 58 California counties.
pub const CALIFORNIA_COUNTIES: &[(&str, &str)] = &[
    ("Alameda", "https://www.acgov.org/"),
    ("Alpine", "https://www.alpinecountyca.gov/"),
    ("Amador", "https://www.amadorgov.org/"),
    ("Butte", "https://www.buttecounty.net/"),
    ("Calaveras", "https://www.calaverasgov.us/"),
    ("Colusa", "https://www.countyofcolusa.org/"),
    ("Contra Costa", "https://www.contracosta.ca.gov/"),
    ("Del Norte", "https://www.dnco.org/"),
    ("El Dorado", "https://www.edcgov.us/"),
    ("Fresno", "https://www.co.fresno.ca.us/"),
    ("Glenn", "https://www.countyofglenn.net/"),
    ("Humboldt", "https://www.humboldtgov.org/"),
    ("Imperial", "https://www.co.imperial.ca.us/"),
    ("Inyo", "https://www.inyocounty.us/"),
    ("Kern", "https://www.kerncounty.com/"),
    ("Kings", "https://www.countyofkings.com/"),
    ("Lake", "https://www.lakecountyca.gov/"),
    ("Lassen", "https://www.lassencounty.org/"),
    ("Los Angeles", "https://www.lacounty.gov/"),
    ("Madera", "https://www.maderacounty.com/"),
    ("Marin", "https://www.marincounty.org/"),
    ("Mariposa", "https://www.mariposacounty.org/"),
    ("Mendocino", "https://www.mendocinocounty.org/"),
    ("Merced", "https://www.co.merced.ca.us/"),
    ("Modoc", "https://www.co.modoc.ca.us/"),
    ("Mono", "https://monocounty.ca.gov/"),
    ("Monterey", "https://www.co.monterey.ca.us/"),
    ("Napa", "https://www.countyofnapa.org/"),
    ("Nevada", "https://www.mynevadacounty.com/"),
    ("Orange", "https://www.ocgov.com/"),
    ("Placer", "https://www.placer.ca.gov/"),
    ("Plumas", "https://www.plumascounty.us/"),
    ("Riverside", "https://www.rivco.org/"),
    ("Sacramento", "https://www.saccounty.net/"),
    ("San Benito", "https://www.cosb.us/"),
    ("San Bernardino", "https://www.sbcounty.gov/"),
    ("San Diego", "https://www.sandiegocounty.gov/"),
    ("San Francisco", "https://sf.gov/"),
    ("San Joaquin", "https://www.sjgov.org/"),
    ("San Luis Obispo", "https://www.slocounty.ca.gov/"),
    ("San Mateo", "https://www.smcgov.org/"),
    ("Santa Barbara", "https://www.countyofsb.org/"),
    ("Santa Clara", "https://www.sccgov.org/"),
    ("Santa Cruz", "https://www.santacruzcounty.us/"),
    ("Shasta", "https://www.co.shasta.ca.us/"),
    ("Sierra", "https://www.sierracounty.ca.gov/"),
    ("Siskiyou", "https://www.co.siskiyou.ca.us/"),
    ("Solano", "https://www.solanocounty.com/"),
    ("Sonoma", "https://sonomacounty.ca.gov/"),
    ("Stanislaus", "https://www.stancounty.com/"),
    ("Sutter", "https://www.suttercounty.org/"),
    ("Tehama", "https://www.co.tehama.ca.us/"),
    ("Trinity", "https://www.trinitycounty.org/"),
    ("Tulare", "https://tularecounty.ca.gov/"),
    ("Tuolumne", "https://www.tuolumnecounty.ca.gov/"),
    ("Ventura", "https://www.ventura.org/"),
    ("Yolo", "https://www.yolocounty.org/"),
    ("Yuba", "https://www.yuba.org/"),
];

pub const PILOT_COUNTIES: &[&str] = &["San Diego", "Alameda", "Fresno", "Sacramento", "Kern"];

pub const BATCH_COUNTIES: &[&str] = &[
    "Alameda",
    "Fresno",
    "Sacramento",
    "Kern",
    "Los Angeles",
    "San Francisco",
    "Orange",
    "Riverside",
    "Santa Clara",
    "Contra Costa",
];

/// County name → root URL, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CountyDirectory {
    entries: IndexMap<String, String>,
}

impl CountyDirectory {
    pub fn california() -> Self {
        Self::from_entries(CALIFORNIA_COUNTIES.iter().copied())
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, url)| (name.to_string(), url.to_string()))
                .collect(),
        }
    }

    pub fn url(&self, county: &str) -> Option<&str> {
        self.entries.get(county).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolve `names` against the directory. Returns the known
    /// `(name, url)` pairs in request order plus the names that were not found.
    pub fn select<'a>(&'a self, names: &[&str]) -> (Vec<(&'a str, &'a str)>, Vec<String>) {
        let mut found = Vec::new();
        let mut missing = Vec::new();
        for name in names {
            match self.entries.get_key_value(*name) {
                Some((k, v)) => found.push((k.as_str(), v.as_str())),
                None => missing.push(name.to_string()),
            }
        }
        (found, missing)
    }
}
